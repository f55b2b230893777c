//! A parallel Poisson-Polya urn Gibbs sampler for HDP-flavored latent
//! Dirichlet allocation.
//!
//! The sampler jointly infers per-token topic assignments, per-topic word
//! distributions, and the number of topics in use, letting the latter grow
//! and shrink across iterations through a Poisson urn birth process over a
//! fixed arena of topic slots. Document sampling is data-parallel with
//! private count deltas merged at batch boundaries (the approximate
//! distributed scheme), and per-type prior draws go through precomputed
//! alias tables rebuilt once per iteration.

pub mod alias;
pub mod assign;
pub mod binom;
pub mod config;
pub mod corpus;
pub mod dirichlet;
pub mod error;
pub mod freq;
pub mod hdp;
pub mod llh;
pub mod mcmc;
pub mod nonzero;
pub mod phi;
pub mod prelude;
pub mod prior;
pub mod testing;
pub mod urn;
pub mod wgt;

pub use config::HdpConfig;
pub use corpus::{Corpus, Document};
pub use error::SamplerError;
pub use hdp::HdpSampler;
