//! HTML presentation of analysis results and chat transcripts.
//!
//! - [`markdown`]: the line-oriented Markdown to HTML converter used for every
//!   model answer.
//! - [`presenter`]: result panels, tabs, the standalone report page and the
//!   terminal progress lines.
//!
//! Nothing here performs I/O; callers decide where the HTML goes.

pub mod markdown;
pub mod presenter;
