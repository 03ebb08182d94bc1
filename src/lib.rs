#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod builder;
pub mod config;
pub mod error;
pub mod fs_view;
pub mod hasher;
pub mod matching;
pub mod models;
pub mod naming;
pub mod resolver;
pub mod rules;

pub use builder::{BuildResult, BundlePlan, BundlePlanner};
pub use config::ProjectConfig;
pub use fs_view::{DiskView, FileSystemView, MemoryView};
pub use hasher::{digest, digest_file};
pub use models::{
  BuildRule, BundleAssignment, Conflict, Diagnostic, FileDigest, NamingStrategy, PatternKind,
  Resolution,
};
pub use resolver::{RuleResolver, resolve};
pub use rules::RuleSet;
