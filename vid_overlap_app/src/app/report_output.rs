use std::io::prelude::*;

use itertools::Itertools;
use serde::Serialize;
use vid_overlap_lib::{FingerprintCertificate, SignalKind, SignalScores, SimilarityResult};

use super::{AppError, OutputFormat};

/// The result of comparing two single frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameComparison {
    pub similarity: f64,
    pub signals: SignalScores,
}

/// Anything the app can print, in either output format.
pub trait Report: Serialize {
    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()>;

    fn write_to(&self, out: &mut dyn Write, format: OutputFormat) -> Result<(), AppError> {
        match format {
            OutputFormat::Normal => self.write_text(out)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, self)?;
                writeln!(out)?;
            }
        }
        Ok(())
    }
}

fn signal_name(kind: SignalKind) -> &'static str {
    match kind {
        SignalKind::PerceptualHash => "perceptual hash",
        SignalKind::DctHash => "DCT hash",
        SignalKind::Embedding => "embedding",
        SignalKind::VisualStats => "visual stats",
    }
}

impl Report for SimilarityResult {
    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "Overall confidence: {:.3}", self.overall_confidence)?;
        writeln!(out, "Visual similarity:  {:.3}", self.visual_similarity)?;
        writeln!(out, "Temporal alignment: {:.3}", self.temporal_alignment)?;
        writeln!(
            out,
            "Frames analyzed:    {} of {} original, {} of {} suspect",
            self.metadata.frames_analyzed_original,
            self.metadata.frame_count_original,
            self.metadata.frames_analyzed_suspect,
            self.metadata.frame_count_suspect
        )?;
        writeln!(out)?;

        if self.matches.is_empty() {
            writeln!(out, "No sequence matches")?;
        } else {
            writeln!(out, "Sequence matches:")?;
            for m in &self.matches {
                let orig = m.original_range();
                let susp = m.suspect_range();
                writeln!(
                    out,
                    "  original frames {}..{} = suspect frames {}..{} (confidence {:.3})",
                    orig.start, orig.end, susp.start, susp.end, m.confidence
                )?;
            }
        }

        write!(out, "Frame matches: {}", self.frame_matches.len())?;
        match self.metadata.mean_timestamp_offset {
            Some(offset) => writeln!(out, " (mean offset {offset:.2}s)")?,
            None => writeln!(out)?,
        }
        Ok(())
    }
}

impl Report for FrameComparison {
    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "Similarity: {:.3}", self.similarity)?;
        for kind in SignalKind::ALL {
            match self.signals.score(kind) {
                Some(score) => writeln!(out, "  {:<16}{score:.3}", signal_name(kind))?,
                None => writeln!(out, "  {:<16}-", signal_name(kind))?,
            }
        }
        Ok(())
    }
}

impl Report for FingerprintCertificate {
    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        let or_none = |hash: &Option<String>| hash.clone().unwrap_or_else(|| "-".to_string());

        writeln!(out, "Algorithm:        {}", self.algorithm_version)?;
        writeln!(out, "Perceptual hash:  {}", or_none(&self.perceptual_hash))?;
        writeln!(out, "DCT hash:         {}", or_none(&self.dct_hash))?;
        if self.has_embedding {
            writeln!(out, "Embedding:        {} dimensions", self.embedding_dimension)?;
        } else {
            writeln!(out, "Embedding:        -")?;
        }
        writeln!(
            out,
            "Signals:          {}",
            self.signals.iter().map(|kind| signal_name(*kind)).join(", ")
        )?;
        writeln!(out, "Self consistency: {:.3}", self.self_consistency)?;
        Ok(())
    }
}
