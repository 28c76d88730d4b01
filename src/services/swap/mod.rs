// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod discovery;
pub mod executor;
pub mod gate;
pub mod intent;
pub mod pipeline;
pub mod routing;
pub mod token;

pub use pipeline::{PipelineSettings, SwapPipeline};
