//! Offscreen draw tests. Each test skips when no adapter is available.

use flock_core::*;
use flock_renderer::*;
use flock_simulation::*;
use glam::{Vec3, Vec4};

const TARGET_SIZE: u32 = 64;
const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

fn gpu() -> Option<GpuContext> {
    match GpuContext::headless_blocking() {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            eprintln!("skipping GPU test: {e}");
            None
        }
    }
}

/// One workgroup of red records stacked on `position`
fn red_flock(position: Vec3) -> Vec<ParticleRecord> {
    let record = ParticleRecord::new(position, position, Vec4::new(1.0, 0.0, 0.0, 1.0), 0.9);
    vec![record; WORK_GROUP_SIZE as usize]
}

/// Clear a square target to black, run `draw`, and read the pixels back.
fn render_offscreen(
    ctx: &GpuContext,
    draw: impl FnOnce(&mut wgpu::RenderPass<'_>),
) -> Vec<[u8; 4]> {
    let extent = wgpu::Extent3d {
        width: TARGET_SIZE,
        height: TARGET_SIZE,
        depth_or_array_layers: 1,
    };
    let target = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Target"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());
    let depth = DepthTarget::new(&ctx.device, TARGET_SIZE, TARGET_SIZE);

    // 64 RGBA8 texels per row is exactly the 256-byte copy alignment.
    let bytes_per_row = TARGET_SIZE * 4;
    let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Offscreen Readback Buffer"),
        size: (bytes_per_row * TARGET_SIZE) as u64,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Offscreen Encoder"),
        });
    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Offscreen Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(depth.attachment()),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        draw(&mut pass);
    }
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &target,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(TARGET_SIZE),
            },
        },
        extent,
    );
    ctx.queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    ctx.wait_idle().expect("poll");
    rx.recv().expect("map callback").expect("map readback");

    let pixels = {
        let data = slice.get_mapped_range();
        bytemuck::cast_slice::<u8, [u8; 4]>(&data).to_vec()
    };
    staging.unmap();
    pixels
}

fn red_pixels(pixels: &[[u8; 4]]) -> usize {
    pixels
        .iter()
        .filter(|[r, g, b, _]| *r > 200 && *g < 50 && *b < 50)
        .count()
}

/// Draw the red flock at the camera target in `mode` and count red pixels.
fn draw_flock(ctx: &GpuContext, mode: PointMode, point_size: f32) -> usize {
    let buffer = SimulationBuffer::create(ctx, &red_flock(Vec3::ZERO)).expect("valid count");
    let index_stream = IndexStream::create(ctx, buffer.count());

    let mut stage = RenderStage::new(
        ctx,
        &POINTS_PROGRAM,
        TARGET_FORMAT,
        mode,
        ShaderFailurePolicy::Abort,
    )
    .expect("embedded point program should build");
    assert!(stage.is_ready());

    let camera = Camera::new(TARGET_SIZE, TARGET_SIZE, Vec3::ZERO);
    let params = ParameterSet {
        point_size,
        ..ParameterSet::default()
    };
    stage.prepare(
        ctx,
        &RenderUniforms::new(&camera, &params, TARGET_SIZE, TARGET_SIZE),
    );
    let bind_group = stage.bind(ctx, &buffer);

    let mut drew = false;
    let pixels = render_offscreen(ctx, |pass| {
        drew = stage.draw(pass, &bind_group, &index_stream);
    });
    assert!(drew);
    red_pixels(&pixels)
}

#[test]
fn native_points_reach_the_target() {
    let Some(ctx) = gpu() else { return };

    assert!(draw_flock(&ctx, PointMode::Native, 4.0) >= 1);
}

#[test]
fn sprites_cover_more_than_one_pixel() {
    let Some(ctx) = gpu() else { return };

    let native = draw_flock(&ctx, PointMode::Native, 4.0);
    let sprite = draw_flock(&ctx, PointMode::Sprite, 4.0);
    assert!(sprite > native, "sprite {} vs native {}", sprite, native);
    assert!(sprite >= 9, "a 4 px sprite covered only {} pixels", sprite);
}

#[test]
fn particles_behind_the_camera_are_clipped() {
    let Some(ctx) = gpu() else { return };

    let camera = Camera::new(TARGET_SIZE, TARGET_SIZE, Vec3::ZERO);
    let behind = camera.position() + (camera.position() - camera.target);
    let buffer = SimulationBuffer::create(&ctx, &red_flock(behind)).expect("valid count");
    let index_stream = IndexStream::create(&ctx, buffer.count());

    let mut stage = RenderStage::new(
        &ctx,
        &POINTS_PROGRAM,
        TARGET_FORMAT,
        PointMode::Sprite,
        ShaderFailurePolicy::Abort,
    )
    .expect("embedded point program should build");
    stage.prepare(
        &ctx,
        &RenderUniforms::new(&camera, &ParameterSet::default(), TARGET_SIZE, TARGET_SIZE),
    );
    let bind_group = stage.bind(&ctx, &buffer);

    let pixels = render_offscreen(&ctx, |pass| {
        stage.draw(pass, &bind_group, &index_stream);
    });
    assert_eq!(red_pixels(&pixels), 0);
}

#[test]
fn axes_build_and_draw_under_abort() {
    let Some(ctx) = gpu() else { return };

    let axes = AxesRenderer::new(&ctx, TARGET_FORMAT, Vec3::ZERO, ShaderFailurePolicy::Abort)
        .expect("embedded axes program should build");
    let camera = Camera::new(TARGET_SIZE, TARGET_SIZE, Vec3::ZERO);
    axes.prepare(&ctx, camera.build_view_projection_matrix());

    let pixels = render_offscreen(&ctx, |pass| axes.draw(pass));
    let lit = pixels.iter().filter(|[r, g, b, _]| *r > 0 || *g > 0 || *b > 0).count();
    assert!(lit > 0);
}

#[test]
fn broken_point_program_is_fatal_under_abort() {
    let Some(ctx) = gpu() else { return };

    let broken = ProgramSource::Embedded {
        label: "broken_points.wgsl",
        code: "@vertex fn vs_sprite( -> {",
    };
    let result = RenderStage::new(
        &ctx,
        &broken,
        TARGET_FORMAT,
        PointMode::Sprite,
        ShaderFailurePolicy::Abort,
    );
    assert!(matches!(result, Err(ProgramError::Compile { .. })));

    let degraded = RenderStage::new(
        &ctx,
        &broken,
        TARGET_FORMAT,
        PointMode::Sprite,
        ShaderFailurePolicy::Degrade,
    )
    .expect("degrade policy keeps running");
    assert!(!degraded.is_ready());
}
