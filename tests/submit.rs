extern crate env_logger;
extern crate pastel;

use std::cell::Cell;
use std::rc::Rc;

use pastel::prelude::*;
use pastel::video::uniform::UniformData;

const VS: &str = "
attribute vec2 aPosition;
uniform mat4 uProjection;
void main() {
    gl_Position = uProjection * vec4(aPosition, 0.0, 1.0);
}
";

const FS: &str = "
uniform vec4 uColor;
void main() {
    gl_FragColor = uColor;
}
";

const IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

fn setup() -> (Context, CallLog) {
    let _ = env_logger::try_init();
    let visitor = HeadlessVisitor::new();
    let log = visitor.log();
    let ctx = Context::new(Box::new(visitor), ContextParams::default()).unwrap();
    (ctx, log)
}

struct Triangle {
    positions: BufferHandle,
    indices: BufferHandle,
}

fn triangle(ctx: &mut Context) -> Triangle {
    let positions: &[[f32; 2]] = &[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
    let indices: &[u16] = &[0, 1, 2];

    Triangle {
        positions: ctx
            .create_buffer(BufferTarget::Vertex, positions, BufferUsage::Static)
            .unwrap(),
        indices: ctx
            .create_buffer(BufferTarget::Index, indices, BufferUsage::Static)
            .unwrap(),
    }
}

fn draw_desc(mesh: &Triangle) -> CommandDescriptor {
    CommandDescriptor::new()
        .vert(VS)
        .frag(FS)
        .vertex_layout(VertexLayout::build().with("aPosition", 0, 2).finish())
        .attributes(VertexAttributes::new().with("aPosition", mesh.positions))
        .elements(mesh.indices)
        .uniform("uProjection", IDENTITY)
}

fn colors(log: &CallLog) -> Vec<[f32; 4]> {
    log.calls()
        .into_iter()
        .filter_map(|v| match v {
            Call::SetUniform {
                data: UniformData::Vector4f(color),
                ..
            } => Some(color),
            _ => None,
        })
        .collect()
}

#[test]
fn triangle_draws_once() {
    let (mut ctx, log) = setup();
    let mesh = triangle(&mut ctx);
    let cmd = ctx
        .command(draw_desc(&mesh).uniform("uColor", [1.0f32, 0.0, 0.0, 1.0]))
        .unwrap();

    log.clear();
    ctx.submit(&cmd).unwrap();

    assert_eq!(
        log.draws(),
        vec![Call::DrawElements {
            count: 3,
            format: IndexFormat::U16,
            offset: 0,
        }]
    );

    assert_eq!(colors(&log), vec![[1.0, 0.0, 0.0, 1.0]]);
}

#[test]
fn redundant_state_is_skipped() {
    let (mut ctx, log) = setup();
    let mesh = triangle(&mut ctx);
    let cmd = ctx
        .command(draw_desc(&mesh).uniform("uColor", [1.0f32, 1.0, 1.0, 1.0]))
        .unwrap();

    log.clear();
    ctx.submit(&cmd).unwrap();
    ctx.submit(&cmd).unwrap();

    let is_use_program = |v: &Call| match *v {
        Call::UseProgram(_) => true,
        _ => false,
    };

    let is_bind_framebuffer = |v: &Call| match *v {
        Call::BindFramebuffer(_) => true,
        _ => false,
    };

    assert_eq!(log.count(is_use_program), 1);
    assert_eq!(log.count(is_bind_framebuffer), 1);
    assert_eq!(log.draws().len(), 2);

    let info = ctx.advance().unwrap();
    assert_eq!(info.drawcalls, 2);
    assert_eq!(ctx.advance().unwrap().drawcalls, 0);
}

#[test]
fn clear_is_not_inherited() {
    let (mut ctx, log) = setup();
    let mesh = triangle(&mut ctx);
    let pass = ctx
        .command(CommandDescriptor::new().clear_color(Color::red()).clear_depth(1.0))
        .unwrap();
    let draw = ctx
        .command(draw_desc(&mesh).uniform("uColor", [1.0f32, 1.0, 1.0, 1.0]))
        .unwrap();

    log.clear();
    ctx.submit_with(&pass, |ctx| {
        ctx.submit(&draw)?;
        ctx.submit(&draw)
    })
    .unwrap();

    let clears: Vec<_> = log
        .calls()
        .into_iter()
        .filter(|v| match *v {
            Call::Clear { .. } => true,
            _ => false,
        })
        .collect();

    assert_eq!(
        clears,
        vec![Call::Clear {
            color: Some(Color::red()),
            depth: Some(1.0),
        }]
    );

    assert_eq!(log.draws().len(), 2);
    assert_eq!(ctx.stack_len(), 0);
}

#[test]
fn uniforms_are_inherited() {
    let (mut ctx, log) = setup();
    let mesh = triangle(&mut ctx);

    let pass = ctx
        .command(
            CommandDescriptor::new()
                .uniform("uColor", [0.0f32, 1.0, 0.0, 1.0])
                .uniform("uTime", 2.0f32),
        )
        .unwrap();

    let plain = ctx.command(draw_desc(&mesh)).unwrap();
    let tinted = ctx
        .command(draw_desc(&mesh).uniform("uColor", [0.0f32, 0.0, 1.0, 1.0]))
        .unwrap();

    log.clear();
    ctx.submit_with(&pass, |ctx| {
        ctx.submit(&plain)?;
        ctx.submit(&tinted)
    })
    .unwrap();

    // uTime is not declared by the program, and is skipped.
    assert_eq!(colors(&log), vec![[0.0, 1.0, 0.0, 1.0], [0.0, 0.0, 1.0, 1.0]]);
    assert_eq!(log.draws().len(), 2);
}

#[test]
fn own_unknown_uniform_fails() {
    let (mut ctx, _) = setup();
    let mesh = triangle(&mut ctx);
    let cmd = ctx
        .command(draw_desc(&mesh).uniform("uColour", [1.0f32, 1.0, 1.0, 1.0]))
        .unwrap();

    match ctx.submit(&cmd) {
        Err(Error::UnknownUniform(ref name)) => assert_eq!(name, "uColour"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn parent_state_is_restored() {
    let (mut ctx, log) = setup();
    let mesh = triangle(&mut ctx);

    let depth = ctx
        .create_texture_2d(None, TextureParams::new(TextureFormat::Depth24, (256, 256)))
        .unwrap();
    let fb = ctx
        .create_framebuffer(FramebufferParams::new().with_depth(depth))
        .unwrap();

    let shadow = ctx
        .command(
            CommandDescriptor::new()
                .name("shadow")
                .framebuffer(fb)
                .viewport(Viewport::new(0, 0, 256, 256))
                .clear_depth(1.0)
                .depth_enable(true),
        )
        .unwrap();

    let draw = ctx
        .command(draw_desc(&mesh).uniform("uColor", [1.0f32, 1.0, 1.0, 1.0]))
        .unwrap();

    let fb_native = log
        .calls()
        .into_iter()
        .filter_map(|v| match v {
            Call::CreateFramebuffer { id, .. } => Some(id),
            _ => None,
        })
        .next()
        .unwrap();

    log.clear();
    ctx.submit_with(&shadow, |ctx| {
        ctx.submit(&draw)?;
        ctx.submit(&draw)
    })
    .unwrap();
    ctx.submit(&draw).unwrap();

    let calls = log.calls();
    let binds: Vec<_> = calls
        .iter()
        .filter_map(|v| match *v {
            Call::BindFramebuffer(id) => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(binds, vec![Some(fb_native), None]);

    let viewports: Vec<_> = calls
        .iter()
        .filter_map(|v| match *v {
            Call::SetViewport(vp) => Some(vp),
            _ => None,
        })
        .collect();
    assert_eq!(
        viewports,
        vec![Viewport::new(0, 0, 256, 256), Viewport::full((640, 320))]
    );

    let restored = calls
        .iter()
        .position(|v| *v == Call::BindFramebuffer(None))
        .unwrap();
    let draws: Vec<_> = calls
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_draw())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(draws.len(), 3);
    assert!(draws[1] < restored && restored < draws[2]);
    assert_eq!(ctx.stack_len(), 0);
}

#[test]
fn failing_closure_unwinds_stack() {
    let (mut ctx, _) = setup();
    let pass = ctx
        .command(CommandDescriptor::new().clear_color(Color::black()))
        .unwrap();

    let result = ctx.submit_with(&pass, |ctx| {
        assert_eq!(ctx.stack_len(), 1);
        Err(Error::OutOfBounds)
    });

    match result {
        Err(Error::OutOfBounds) => {}
        other => panic!("unexpected {:?}", other),
    }

    assert_eq!(ctx.stack_len(), 0);
}

#[test]
fn batches_match_sequential_overrides() {
    let record = |batched: bool| {
        let (mut ctx, log) = setup();
        let mesh = triangle(&mut ctx);
        let cmd = ctx
            .command(draw_desc(&mesh).uniform("uColor", [1.0f32, 1.0, 1.0, 1.0]))
            .unwrap();

        let batches = vec![
            Override::new().uniform("uColor", [1.0f32, 0.0, 0.0, 1.0]),
            Override::new().uniform("uColor", [0.0f32, 1.0, 0.0, 1.0]),
        ];

        log.clear();
        if batched {
            ctx.submit_batches(&cmd, &batches).unwrap();
        } else {
            for over in &batches {
                ctx.submit_override(&cmd, over).unwrap();
            }
        }

        log.calls()
    };

    let batched = record(true);
    assert_eq!(batched, record(false));
    assert_eq!(batched.iter().filter(|v| v.is_draw()).count(), 2);
}

#[test]
fn override_rejects_sources() {
    let (mut ctx, _) = setup();
    let mesh = triangle(&mut ctx);
    let cmd = ctx
        .command(draw_desc(&mesh).uniform("uColor", [1.0f32, 1.0, 1.0, 1.0]))
        .unwrap();

    let over = Override::new().set("vert", VS);
    match ctx.submit_override(&cmd, &over) {
        Err(Error::InvalidCommandField { ref key, .. }) => assert_eq!(key, "vert"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn updated_buffer_is_drawn() {
    let (mut ctx, log) = setup();
    let mesh = triangle(&mut ctx);
    let cmd = ctx
        .command(draw_desc(&mesh).uniform("uColor", [1.0f32, 1.0, 1.0, 1.0]))
        .unwrap();

    let index_native = log
        .calls()
        .into_iter()
        .filter_map(|v| match v {
            Call::CreateBuffer {
                id,
                target: BufferTarget::Index,
                ..
            } => Some(id),
            _ => None,
        })
        .next()
        .unwrap();

    let indices: &[u16] = &[0, 1, 2, 2, 1, 0];
    ctx.update_buffer(mesh.indices, indices).unwrap();

    log.clear();
    ctx.submit(&cmd).unwrap();

    assert_eq!(
        log.draws(),
        vec![Call::DrawElements {
            count: 6,
            format: IndexFormat::U16,
            offset: 0,
        }]
    );

    assert_eq!(
        log.buffer(index_native),
        Some(BufferData::from(indices).to_bytes())
    );
}

#[test]
fn elements_range() {
    let (mut ctx, log) = setup();
    let mesh = triangle(&mut ctx);
    let cmd = ctx
        .command(
            draw_desc(&mesh)
                .uniform("uColor", [1.0f32, 1.0, 1.0, 1.0])
                .elements(Elements::new(mesh.indices).with_count(2).with_offset(1)),
        )
        .unwrap();

    log.clear();
    ctx.submit(&cmd).unwrap();
    assert_eq!(
        log.draws(),
        vec![Call::DrawElements {
            count: 2,
            format: IndexFormat::U16,
            offset: 2,
        }]
    );

    let cmd = ctx
        .command(
            draw_desc(&mesh)
                .uniform("uColor", [1.0f32, 1.0, 1.0, 1.0])
                .elements(Elements::new(mesh.indices).with_count(3).with_offset(1)),
        )
        .unwrap();

    match ctx.submit(&cmd) {
        Err(Error::OutOfBounds) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn computed_uniforms_resolve_per_submit() {
    let (mut ctx, log) = setup();
    let mesh = triangle(&mut ctx);

    let counter = Rc::new(Cell::new(0));
    let c = counter.clone();
    let color = UniformValue::computed(move || {
        c.set(c.get() + 1);
        [c.get() as f32, 0.0, 0.0, 1.0]
    });

    let cmd = ctx.command(draw_desc(&mesh).uniform("uColor", color)).unwrap();

    log.clear();
    ctx.submit(&cmd).unwrap();
    ctx.submit(&cmd).unwrap();

    assert_eq!(counter.get(), 2);
    assert_eq!(colors(&log), vec![[1.0, 0.0, 0.0, 1.0], [2.0, 0.0, 0.0, 1.0]]);
}

#[test]
fn incomplete_draws() {
    let (mut ctx, _) = setup();
    let mesh = triangle(&mut ctx);

    let cmd = ctx
        .command(
            CommandDescriptor::new()
                .vert(VS)
                .frag(FS)
                .vertex_layout(VertexLayout::build().with("aPosition", 0, 2).finish())
                .attributes(VertexAttributes::new().with("aPosition", mesh.positions))
                .uniform("uProjection", IDENTITY),
        )
        .unwrap();
    match ctx.submit(&cmd) {
        Err(Error::IncompleteDraw { missing, .. }) => assert_eq!(missing, "elements"),
        other => panic!("unexpected {:?}", other),
    }

    let cmd = ctx
        .command(
            CommandDescriptor::new()
                .vertex_layout(VertexLayout::build().with("aPosition", 0, 2).finish())
                .attributes(VertexAttributes::new().with("aPosition", mesh.positions))
                .elements(mesh.indices),
        )
        .unwrap();
    match ctx.submit(&cmd) {
        Err(Error::NoActiveProgram(id)) => assert_eq!(id, cmd.id()),
        other => panic!("unexpected {:?}", other),
    }

    // Without a program the missing elements are not reported.
    let cmd = ctx
        .command(
            CommandDescriptor::new()
                .vertex_layout(VertexLayout::build().with("aPosition", 0, 2).finish())
                .attributes(VertexAttributes::new().with("aPosition", mesh.positions)),
        )
        .unwrap();
    match ctx.submit(&cmd) {
        Err(Error::NoActiveProgram(id)) => assert_eq!(id, cmd.id()),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn attributes_without_layout_draw() {
    let (mut ctx, log) = setup();
    let mesh = triangle(&mut ctx);
    let cmd = ctx
        .command(
            CommandDescriptor::new()
                .vert(VS)
                .frag(FS)
                .attributes(VertexAttributes::new().with("aPosition", mesh.positions))
                .elements(mesh.indices)
                .uniform("uProjection", IDENTITY)
                .uniform("uColor", [0.0f32, 1.0, 0.0, 1.0]),
        )
        .unwrap();

    log.clear();
    ctx.submit(&cmd).unwrap();

    let sizes: Vec<_> = log
        .calls()
        .into_iter()
        .filter_map(|v| match v {
            Call::VertexAttribute { location, pointer } => Some((location, pointer.size)),
            _ => None,
        })
        .collect();
    assert_eq!(sizes, vec![(0, 2)]);

    assert_eq!(
        log.draws(),
        vec![Call::DrawElements {
            count: 3,
            format: IndexFormat::U16,
            offset: 0,
        }]
    );
}

#[test]
fn attribute_without_layout_size_is_rejected() {
    let (mut ctx, log) = setup();
    let mesh = triangle(&mut ctx);
    let vs = "
attribute mat4 aInstance;
void main() {
    gl_Position = aInstance * vec4(0.0, 0.0, 0.0, 1.0);
}
";

    log.clear();
    let desc = CommandDescriptor::new()
        .vert(vs)
        .frag(FS)
        .attributes(VertexAttributes::new().with("aInstance", mesh.positions))
        .elements(mesh.indices);
    match ctx.command(desc) {
        Err(Error::MalformedAttribute { name, .. }) => assert_eq!(name, "aInstance"),
        other => panic!("unexpected {:?}", other),
    }

    // The program linked for it is released again.
    let created = log.count(|v| match *v {
        Call::LinkProgram { .. } => true,
        _ => false,
    });
    let deleted = log.count(|v| match *v {
        Call::DeleteProgram(_) => true,
        _ => false,
    });
    assert_eq!(created, 1);
    assert_eq!(deleted, 1);
}

#[test]
fn deleted_resources_fail_on_submit() {
    let (mut ctx, _) = setup();
    let mesh = triangle(&mut ctx);
    let cmd = ctx
        .command(draw_desc(&mesh).uniform("uColor", [1.0f32, 1.0, 1.0, 1.0]))
        .unwrap();

    ctx.delete(mesh.positions).unwrap();
    match ctx.submit(&cmd) {
        Err(Error::BufferHandleInvalid(h)) => assert_eq!(h, mesh.positions),
        other => panic!("unexpected {:?}", other),
    }
}
