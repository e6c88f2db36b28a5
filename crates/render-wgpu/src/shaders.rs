use cisco_render::RenderError;

/// WGSL shader for every mesh: ambient plus one directional diffuse light.
///
/// Group 0 holds per-frame camera and light values, group 1 the per-mesh
/// model transform, normal matrix and colour. Only locations 0 (position)
/// and 1 (normal) are read, so both vertex layouts share this module.
pub const LIGHTING_SHADER: &str = r#"
struct FrameUniforms {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    light_dir: vec4<f32>,
    light_color: vec4<f32>,
    ambient: vec4<f32>,
};

struct MeshUniforms {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;

@group(1) @binding(0)
var<uniform> mesh: MeshUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world_pos = mesh.model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = frame.projection * frame.view * world_pos;
    out.world_normal = (mesh.normal_matrix * vec4<f32>(vertex.normal, 0.0)).xyz;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(in.world_normal);
    let to_light = normalize(-frame.light_dir.xyz);
    let diffuse = max(dot(normal, to_light), 0.0) * frame.light_color.rgb;
    let lit = (frame.ambient.rgb + diffuse) * mesh.color.rgb;
    return vec4<f32>(lit, mesh.color.a);
}
"#;

/// Compile [`LIGHTING_SHADER`], surfacing validation errors instead of
/// letting the device's uncaptured-error handler abort.
pub fn compile_lighting_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule, RenderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("lighting_shader"),
        source: wgpu::ShaderSource::Wgsl(LIGHTING_SHADER.into()),
    });
    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        return Err(RenderError::ShaderCompile {
            label: "lighting_shader",
            message: error.to_string(),
        });
    }
    tracing::debug!("lighting shader compiled");
    Ok(module)
}
