pub mod axes;
pub mod depth;
pub mod model;
pub mod pipeline;
pub mod render;

pub use axes::{AxesGizmo, AxisVertex};
pub use depth::{DEPTH_FORMAT, create_depth};
pub use model::{
    AMBIENT_LEVEL, GpuMesh, LIGHT_DIRECTION, LIGHT_INTENSITY, Material, MaterialUniform,
    ModelUniform, SceneModel, Vertex, create_model_ubo, update_model_ubo,
};
pub use pipeline::{Layouts, create_bind_group_layouts, create_pipeline};
pub use render::SceneRenderer;
