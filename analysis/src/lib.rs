//! Decomposition planning and load monitoring for distributed solver runs.
//!
//! `decompose` turns a worker count into a 2D or 3D worker grid, `monitor` measures how
//! evenly the workers' latest output is spread over their `processor<N>` trees and
//! `fields` samples uniform field values from written time steps.

pub mod decompose;
pub mod fields;
pub mod monitor;
pub mod workers;

pub use decompose::{
    best_2d_pair, best_3d_triplet, factors, plan, DecomposeError, Decomposition,
    DecompositionShape, Dimensions, FactorPair, FactorTriplet, DEFAULT_RATIO,
};
pub use fields::{field_history, field_names, read_uniform_value, FieldError, FieldSample};
pub use monitor::{
    imbalance, latest_time_step, list_time_steps, size_of, written_time_steps,
    ImbalanceReport, ProbeError, TimeStep,
};
pub use workers::{list_worker_directories, worker_count, worker_root, WorkerDir};
