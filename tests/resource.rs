extern crate env_logger;
extern crate pastel;

use std::f32;

use pastel::prelude::*;

fn setup() -> (Context, CallLog) {
    let _ = env_logger::try_init();
    let visitor = HeadlessVisitor::new();
    let log = visitor.log();
    let ctx = Context::new(Box::new(visitor), ContextParams::default()).unwrap();
    (ctx, log)
}

fn native_buffer(log: &CallLog) -> NativeId {
    log.calls()
        .into_iter()
        .filter_map(|v| match v {
            Call::CreateBuffer { id, .. } => Some(id),
            _ => None,
        })
        .last()
        .unwrap()
}

#[test]
fn buffer_lifecycle() {
    let (mut ctx, log) = setup();
    let positions: &[[f32; 3]] = &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];

    let vbo = ctx
        .create_buffer(BufferTarget::Vertex, positions, BufferUsage::Dynamic)
        .unwrap();

    let params = ctx.buffer_params(vbo).unwrap();
    assert_eq!(params.element, ElementType::F32);
    assert_eq!(params.len, 6);
    assert_eq!(params.size(), 24);

    let id = native_buffer(&log);
    assert_eq!(log.buffer(id), Some(BufferData::from(positions).to_bytes()));

    let grown: &[[f32; 3]] = &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    ctx.update(vbo.into(), BufferData::from(grown).into()).unwrap();
    assert_eq!(ctx.buffer_params(vbo).unwrap().len, 9);
    assert_eq!(log.buffer(id), Some(BufferData::from(grown).to_bytes()));

    ctx.delete(vbo).unwrap();
    assert!(ctx.buffer_params(vbo).is_none());
    assert_eq!(log.calls().last(), Some(&Call::DeleteBuffer(id)));

    match ctx.delete(vbo) {
        Err(Error::BufferHandleInvalid(h)) => assert_eq!(h, vbo),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn non_finite_update_is_rejected() {
    let (mut ctx, log) = setup();
    let positions: &[f32] = &[0.0, 1.0, 2.0, 3.0];
    let vbo = ctx
        .create_buffer(BufferTarget::Vertex, positions, BufferUsage::Dynamic)
        .unwrap();

    let id = native_buffer(&log);
    log.clear();

    let broken: &[f32] = &[0.0, 1.0, f32::NAN, 3.0];
    match ctx.update_buffer(vbo, broken) {
        Err(Error::DataIntegrity { index }) => assert_eq!(index, 2),
        other => panic!("unexpected {:?}", other),
    }

    assert!(log.is_empty());
    assert_eq!(log.buffer(id), Some(BufferData::from(positions).to_bytes()));

    match ctx.create_buffer(BufferTarget::Vertex, broken, BufferUsage::Static) {
        Err(Error::DataIntegrity { index }) => assert_eq!(index, 2),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn element_types_are_checked() {
    let (mut ctx, _) = setup();

    let indices: &[u32] = &[0, 1, 2];
    match ctx.create_buffer(BufferTarget::Index, indices, BufferUsage::Static) {
        Err(Error::InvalidData { .. }) => {}
        other => panic!("unexpected {:?}", other),
    }

    let positions: &[f32] = &[0.0, 1.0];
    let vbo = ctx
        .create_buffer(BufferTarget::Vertex, positions, BufferUsage::Static)
        .unwrap();

    let shorts: &[u16] = &[0, 1];
    match ctx.update_buffer(vbo, shorts) {
        Err(Error::InvalidData { .. }) => {}
        other => panic!("unexpected {:?}", other),
    }

    let texels: &[u8] = &[0; 4];
    match ctx.update(vbo.into(), TextureData::from(texels).into()) {
        Err(Error::InvalidData { .. }) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn buffer_range() {
    let (mut ctx, log) = setup();
    let data: &[f32] = &[0.0, 1.0, 2.0, 3.0];
    let vbo = ctx
        .create_buffer(BufferTarget::Vertex, data, BufferUsage::Dynamic)
        .unwrap();

    let id = native_buffer(&log);
    let patch: &[f32] = &[8.0, 9.0];
    ctx.update_buffer_range(vbo, 2, patch).unwrap();

    assert_eq!(
        log.calls().last(),
        Some(&Call::UpdateBuffer {
            id,
            offset: 8,
            size: 8,
        })
    );

    let expected: &[f32] = &[0.0, 1.0, 8.0, 9.0];
    assert_eq!(log.buffer(id), Some(BufferData::from(expected).to_bytes()));

    match ctx.update_buffer_range(vbo, 3, patch) {
        Err(Error::OutOfBounds) => {}
        other => panic!("unexpected {:?}", other),
    }

    match ctx.update_buffer_range(vbo, usize::MAX, patch) {
        Err(Error::OutOfBounds) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn texture_data_is_validated() {
    let (mut ctx, log) = setup();
    let params = TextureParams::new(TextureFormat::RGBA8, (2, 2));

    let texels = vec![255u8; 16];
    let texture = ctx
        .create_texture_2d(Some(TextureData::from(&texels[..])), params)
        .unwrap();
    assert_eq!(ctx.texture_params(texture), Some(params));

    match ctx.update_texture(texture, TextureData::from(&texels[..12])) {
        Err(Error::InvalidData { .. }) => {}
        other => panic!("unexpected {:?}", other),
    }

    let floats = vec![0.0f32; 16];
    match ctx.update_texture(texture, TextureData::from(&floats[..])) {
        Err(Error::InvalidData { .. }) => {}
        other => panic!("unexpected {:?}", other),
    }

    log.clear();
    ctx.update_texture(texture, TextureData::from(vec![0u8; 16]))
        .unwrap();
    assert_eq!(log.len(), 1);

    let hdr = TextureParams::new(TextureFormat::RGBA32F, (1, 1));
    match ctx.create_texture_2d(Some(vec![0.0, f32::INFINITY, 0.0, 1.0].into()), hdr) {
        Err(Error::DataIntegrity { index }) => assert_eq!(index, 1),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn framebuffer_attachments() {
    let (mut ctx, log) = setup();
    let color = |ctx: &mut Context, dimensions| {
        ctx.create_texture_2d(None, TextureParams::new(TextureFormat::RGBA8, dimensions))
            .unwrap()
    };

    let c0 = color(&mut ctx, (64, 64));
    let c1 = color(&mut ctx, (64, 64));
    let depth = ctx
        .create_texture_2d(None, TextureParams::new(TextureFormat::Depth16, (64, 64)))
        .unwrap();

    let fb = ctx
        .create_framebuffer(FramebufferParams::new().with_color(c0).with_color(c1).with_depth(depth))
        .unwrap();
    assert!(log.calls().iter().any(|v| match *v {
        Call::CreateFramebuffer { ref colors, depth, .. } => colors.len() == 2 && depth.is_some(),
        _ => false,
    }));

    let small = color(&mut ctx, (32, 32));
    match ctx.create_framebuffer(FramebufferParams::new().with_color(c0).with_color(small)) {
        Err(Error::FramebufferIncomplete(_)) => {}
        other => panic!("unexpected {:?}", other),
    }

    match ctx.create_framebuffer(FramebufferParams::new().with_color(depth)) {
        Err(Error::FramebufferIncomplete(_)) => {}
        other => panic!("unexpected {:?}", other),
    }

    match ctx.create_framebuffer(FramebufferParams::new()) {
        Err(Error::FramebufferIncomplete(_)) => {}
        other => panic!("unexpected {:?}", other),
    }

    let mut params = FramebufferParams::new();
    for _ in 0..5 {
        params = params.with_color(c0);
    }

    match ctx.create_framebuffer(params) {
        Err(Error::TooManyColorAttachments(4)) => {}
        other => panic!("unexpected {:?}", other),
    }

    ctx.delete(fb).unwrap();
    let cmd = CommandDescriptor::new().framebuffer(fb);
    match ctx.command(cmd) {
        Err(Error::FramebufferHandleInvalid(h)) => assert_eq!(h, fb),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn invalid_params() {
    let _ = env_logger::try_init();
    let params = ContextParams {
        dimensions: (0, 480),
        ..Default::default()
    };

    match Context::new(Box::new(HeadlessVisitor::new()), params) {
        Err(Error::InvalidParams(_)) => {}
        Err(err) => panic!("unexpected {:?}", err),
        Ok(_) => panic!("zero dimensions are accepted"),
    }

    let params = ContextParams::from_json(r#"{ "dimensions": [800, 600], "max_texture_units": 2 }"#)
        .unwrap();
    let ctx = Context::new(Box::new(HeadlessVisitor::new()), params).unwrap();
    assert_eq!(ctx.params().dimensions, (800, 600));
    assert!(!ctx.params().debug);
}

#[test]
fn drop_releases_everything() {
    let (mut ctx, log) = setup();
    let data: &[f32] = &[0.0, 1.0];
    ctx.create_buffer(BufferTarget::Vertex, data, BufferUsage::Static)
        .unwrap();
    let color = ctx
        .create_texture_2d(None, TextureParams::new(TextureFormat::RGBA8, (8, 8)))
        .unwrap();
    ctx.create_framebuffer(FramebufferParams::new().with_color(color))
        .unwrap();

    log.clear();
    drop(ctx);

    assert_eq!(log.len(), 3);
    match log.calls()[0] {
        Call::DeleteFramebuffer(_) => {}
        ref other => panic!("unexpected {:?}", other),
    }
}
