pub(crate) mod compositor;
pub(crate) mod layout;
pub(crate) mod sampler;

pub use compositor::{composite, CompositeOptions, Divider, ResizeFilter};
pub use layout::{grid_for, interpret_target_dimensions, Dimensions, TilePlan, DEFAULT_MAX_OUTPUT};
pub use sampler::{sample_indices, SamplePlan};
