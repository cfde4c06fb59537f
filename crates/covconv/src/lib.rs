//! covconv: coverage-set aggregation and report pipeline
//!
//! Collects code-coverage artifacts from test-session descriptors and file
//! patterns, merges them into one artifact through an external coverage
//! engine, builds the XML report and runs it through XSLT stylesheets.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌────────────┐   ┌──────────────┐
//! │ descriptors  │──►│ CoverageSet │──►│ MergePlan  │──►│ CoverageEngine│
//! │ (.trx)       │   │  ∪ --in     │   │ (sorted)   │   │ merge / load │
//! └──────────────┘   └─────────────┘   └────────────┘   └──────┬───────┘
//!                                                              │
//!                    ┌─────────────┐   ┌────────────────┐      │
//!                    │ derived xml │◄──│ TransformChain │◄─────┘ report.xml
//!                    └─────────────┘   └────────────────┘
//! ```
//!
//! The binary coverage format and the stylesheet language are never
//! interpreted here; [`CoverageEngine`] and [`Transformer`] are the seams
//! where external tools plug in.

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::missing_const_for_fn))]

pub mod command;
pub mod config;
pub mod coverage_set;
pub mod descriptor;
pub mod engine;
pub mod merge;
pub mod pipeline;
pub mod report;
pub mod resolver;
mod result;
pub mod scratch;
pub mod transform;

pub use config::{ConverterConfig, EngineConfig, TransformConfig};
pub use coverage_set::CoverageSet;
pub use descriptor::{extract, DescriptorExtraction};
pub use engine::{CommandEngine, CoverageEngine};
pub use merge::{consolidate, MergePlan, MergeStep};
pub use pipeline::{ConvertOutcome, ConvertRequest, NoopObserver, Pipeline, PipelineObserver};
pub use report::{build_report, default_output_path, ReportDocument};
pub use resolver::{resolve, Resolution};
pub use result::{ConvertError, ConvertResult};
pub use scratch::ScratchSpace;
pub use transform::{
    apply_chain, apply_each, derived_output_path, CommandTransformer, TransformStage, Transformer,
};
