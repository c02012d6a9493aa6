pub mod blocks;
pub mod cache;
pub mod driver;
pub mod emma;
pub mod equiv;
pub mod error;
pub mod genotype;
pub mod interval;
pub mod io;
pub mod maxk;
pub mod phenotype;
pub mod phylo;
pub mod sdp;
pub mod stats;
