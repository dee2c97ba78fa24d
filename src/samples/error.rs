// Copyright (C) 2026 The sampad authors
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

/// Errors raised while loading a sample.
///
/// All of these are fatal to that single load and are surfaced to the bank
/// loader, which decides whether to skip the pad or abort. None of them can
/// occur on the render path, which never decodes.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// The file is not a valid WAV container.
    #[error("failed to decode WAV: {0}")]
    Decode(hound::Error),

    /// The WAV is valid but uses a format outside the supported set
    /// (8/16/24-bit integer PCM, mono or stereo).
    #[error("unsupported WAV format: {0}")]
    UnsupportedFormat(String),

    /// Filesystem failure while resolving or reading the file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<hound::Error> for SampleError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => SampleError::Io(io),
            other => SampleError::Decode(other),
        }
    }
}
