// src/lib.rs
/*!
Metropolis sampling of SU(3) lattice gauge configurations and Wilson-loop observables.

The crate is layered bottom-up:
- `math`: the `Scalar` trait, a flat dense tensor and the 3×3 SU(3) link algebra.
- `space`: periodic 4-D coordinates and full link configurations.
- `gauge`: candidate pool, local Wilson action (standard and tadpole-improved), the
  Metropolis sampler, run settings and ensemble files.
- `observables`: Wilson loops, ensemble estimators, R×T tables and spatial smearing.

Directions `0, 1, 2` are spatial and direction `3` is Euclidean time throughout.
*/

pub mod error;

pub mod math {
    pub mod scalar;
    pub mod su3;
    pub mod tensor {
        pub mod dense;
    }
}

pub mod space {
    pub mod configuration;
    pub mod coordinate;
}

pub mod gauge {
    pub mod action;
    pub mod candidates;
    pub mod metropolis;
    pub mod persistence;
    pub mod settings;
}

pub mod observables {
    pub mod estimators;
    pub mod report;
    pub mod smearing;
    pub mod wilson;
}

pub use error::{LatticeError, Result};
pub use gauge::metropolis::{GaugeMetropolis, RunSummary, SamplerState};
pub use gauge::settings::{SamplerSettings, SeedPolicy};
pub use math::su3::{LinkAlgebra, Su3Matrix};
pub use observables::estimators::{Analysis, CustomObservable, Estimate};
pub use space::configuration::LatticeConfiguration;
pub use space::coordinate::LatticeCoordinate;

#[cfg(test)]
mod tests {
    mod scenarios;
    mod persistence;
}
