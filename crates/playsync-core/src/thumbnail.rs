//! Cover-art embedding through the external muxer.
//!
//! The muxer copies the audio stream untouched and attaches the image as
//! cover art. Failures are logged and reported through [`EmbedOutcome`];
//! they never propagate past this module.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::error::Result;
use crate::naming::TempNaming;
use crate::process::CommandRunner;

/// Result of one embed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedOutcome {
    /// The destination now carries the image as cover art.
    Embedded,
    /// The muxer failed; the destination was left as it was.
    Failed(String),
}

impl EmbedOutcome {
    /// Whether the embed succeeded.
    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded)
    }
}

/// Embeds thumbnails into audio files.
pub struct ThumbnailEmbedder {
    runner: Arc<dyn CommandRunner>,
    muxer: String,
    temp: TempNaming,
}

impl ThumbnailEmbedder {
    /// Create an embedder invoking `muxer` through `runner`.
    pub fn new(runner: Arc<dyn CommandRunner>, muxer: impl Into<String>, temp: TempNaming) -> Self {
        Self {
            runner,
            muxer: muxer.into(),
            temp,
        }
    }

    /// Muxer arguments writing `audio` + `image` to `output`, overwriting it.
    #[must_use]
    pub fn mux_args(audio: &Path, image: &Path, output: &Path) -> Vec<String> {
        vec![
            "-i".to_string(),
            audio.display().to_string(),
            "-i".to_string(),
            image.display().to_string(),
            "-map".to_string(),
            "0".to_string(),
            "-map".to_string(),
            "1".to_string(),
            "-c".to_string(),
            "copy".to_string(),
            "-disposition:v".to_string(),
            "attached_pic".to_string(),
            output.display().to_string(),
            "-y".to_string(),
        ]
    }

    /// Embed `image` into `audio`, writing the result to `destination`.
    ///
    /// `destination` may equal `audio`: the muxer then writes the temp-named
    /// sibling, which replaces the original once the mux succeeded. A failed
    /// mux can leave that sibling behind for the cleanup step.
    pub fn embed(&self, audio: &Path, image: &Path, destination: &Path) -> EmbedOutcome {
        let in_place = audio == destination;
        let output = if in_place {
            self.temp.temp_path_for(audio)
        } else {
            destination.to_path_buf()
        };

        let outcome = match self.mux(audio, image, &output) {
            Ok(()) if in_place => match fs::rename(&output, destination) {
                Ok(()) => EmbedOutcome::Embedded,
                Err(e) => EmbedOutcome::Failed(format!(
                    "could not replace {} with {}: {e}",
                    destination.display(),
                    output.display()
                )),
            },
            Ok(()) => EmbedOutcome::Embedded,
            Err(e) => EmbedOutcome::Failed(e.to_string()),
        };

        match &outcome {
            EmbedOutcome::Embedded => info!("Thumbnail embedded: {}", audio.display()),
            EmbedOutcome::Failed(reason) => error!(
                "Thumbnail embed failed for {}\nError: {}",
                audio.display(),
                reason
            ),
        }
        outcome
    }

    fn mux(&self, audio: &Path, image: &Path, output: &Path) -> Result<()> {
        debug!("Muxing {} + {} -> {}", audio.display(), image.display(), output.display());
        self.runner
            .run(&self.muxer, &Self::mux_args(audio, image, output))?
            .check(&self.muxer)?;
        Ok(())
    }
}
