extern crate env_logger;
extern crate pastel;

use pastel::prelude::*;
use pastel::video::uniform::UniformData;

const VS: &str = "
attribute vec2 aPosition;
attribute vec2 aTexcoord;
uniform mat3 uTransform;
varying vec2 vTexcoord;
void main() {
    vTexcoord = aTexcoord;
    gl_Position = vec4(uTransform * vec3(aPosition, 1.0), 1.0);
}
";

const FS: &str = "
uniform sampler2D uAlbedo;
uniform sampler2D uDetail;
uniform float uWeights[3];
uniform int uMode;
varying vec2 vTexcoord;
void main() {
    vec4 a = texture2D(uAlbedo, vTexcoord) * uWeights[0];
    vec4 d = texture2D(uDetail, vTexcoord) * uWeights[2];
    gl_FragColor = a + d * float(uMode);
}
";

fn setup(params: ContextParams) -> (Context, CallLog) {
    let _ = env_logger::try_init();
    let visitor = HeadlessVisitor::new();
    let log = visitor.log();
    let ctx = Context::new(Box::new(visitor), params).unwrap();
    (ctx, log)
}

fn texture(ctx: &mut Context) -> TextureHandle {
    let texels = vec![255u8; 4 * 4 * 4];
    ctx.create_texture_2d(
        Some(texels.into()),
        TextureParams::new(TextureFormat::RGBA8, (4, 4)),
    )
    .unwrap()
}

fn uploads(log: &CallLog) -> Vec<(i32, UniformData)> {
    log.calls()
        .into_iter()
        .filter_map(|v| match v {
            Call::SetUniform { location, data } => Some((location, data)),
            _ => None,
        })
        .collect()
}

#[test]
fn tables() {
    let (mut ctx, log) = setup(ContextParams::default());
    let program = ctx
        .create_program(VS, FS, &["aPosition", "aTexcoord"])
        .unwrap();

    let linked = log
        .calls()
        .into_iter()
        .filter_map(|v| match v {
            Call::LinkProgram { bindings, .. } => Some(bindings),
            _ => None,
        })
        .next()
        .unwrap();
    assert_eq!(
        linked,
        vec![(0, "aPosition".to_owned()), (1, "aTexcoord".to_owned())]
    );

    let program = ctx.program(program).unwrap();
    assert_eq!(program.attribute("aTexcoord").unwrap().location, 1);
    assert_eq!(program.uniform("uTransform").unwrap().tp, UniformType::Mat3);
    assert_eq!(program.uniform("uWeights").unwrap().size, 3);
    assert!(program.uniform("uWeights[2]").is_some());
    assert!(program.declares("uAlbedo"));
    assert!(!program.declares("uMissing"));

    // Both shaders are released once linked.
    assert_eq!(
        log.count(|v| match *v {
            Call::DeleteShader(_) => true,
            _ => false,
        }),
        2
    );
}

#[test]
fn inactive_attribute() {
    let (mut ctx, _) = setup(ContextParams::default());
    match ctx.create_program(VS, FS, &["aPosition", "aNormal"]) {
        Err(Error::AttributeUndefined(ref name)) => assert_eq!(name, "aNormal"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn set_uniform() {
    let (mut ctx, log) = setup(ContextParams::default());
    let program = ctx
        .create_program(VS, FS, &["aPosition", "aTexcoord"])
        .unwrap();

    log.clear();
    ctx.set_uniform(program, "uMode", 2).unwrap();
    ctx.set_uniform(program, "uWeights", vec![0.5f32, 0.25, 0.125]).unwrap();

    let mode = ctx.program(program).unwrap().uniform("uMode").unwrap().location;
    let weights = ctx.program(program).unwrap().uniform("uWeights[0]").unwrap().location;

    assert_eq!(
        uploads(&log),
        vec![
            (mode, UniformData::I32(2)),
            (weights, UniformData::F32(0.5)),
            (weights + 1, UniformData::F32(0.25)),
            (weights + 2, UniformData::F32(0.125)),
        ]
    );

    assert_eq!(
        log.count(|v| match *v {
            Call::UseProgram(_) => true,
            _ => false,
        }),
        1
    );

    match ctx.set_uniform(program, "uFoo", 1.0f32) {
        Err(Error::UnknownUniform(ref name)) => assert_eq!(name, "uFoo"),
        other => panic!("unexpected {:?}", other),
    }

    match ctx.set_uniform(program, "uTransform", [1.0f32, 0.0, 0.0, 1.0]) {
        Err(Error::Arity {
            expected, actual, ..
        }) => {
            assert_eq!(expected, 9);
            assert_eq!(actual, 4);
        }
        other => panic!("unexpected {:?}", other),
    }

    match ctx.set_uniform(program, "uMode", 1.5f32) {
        Err(Error::UniformTypeMismatch { .. }) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn texture_units() {
    let (mut ctx, log) = setup(ContextParams::default());
    let albedo = texture(&mut ctx);
    let detail = texture(&mut ctx);

    let positions: &[[f32; 2]] = &[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
    let vbo = ctx
        .create_buffer(BufferTarget::Vertex, positions, BufferUsage::Static)
        .unwrap();
    let indices: &[u16] = &[0, 1, 2];
    let ibo = ctx
        .create_buffer(BufferTarget::Index, indices, BufferUsage::Static)
        .unwrap();

    let layout = VertexLayout::build()
        .with("aPosition", 0, 2)
        .with("aTexcoord", 1, 2)
        .finish();

    let cmd = ctx
        .command(
            CommandDescriptor::new()
                .vert(VS)
                .frag(FS)
                .vertex_layout(layout)
                .attributes(
                    VertexAttributes::new()
                        .with("aPosition", vbo)
                        .with("aTexcoord", vbo),
                )
                .elements(ibo)
                .uniform("uTransform", [[1.0f32, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
                .uniform("uAlbedo", albedo)
                .uniform("uDetail", detail)
                .uniform("uWeights", vec![1.0f32, 1.0, 1.0])
                .uniform("uMode", 1),
        )
        .unwrap();

    let binds = |log: &CallLog| {
        log.count(|v| match *v {
            Call::BindTexture { .. } => true,
            _ => false,
        })
    };

    log.clear();
    ctx.submit(&cmd).unwrap();
    assert_eq!(binds(&log), 2);

    let samplers: Vec<_> = uploads(&log)
        .into_iter()
        .filter_map(|(_, data)| match data {
            UniformData::I32(unit) => Some(unit),
            _ => None,
        })
        .collect();
    // uAlbedo, uDetail and uMode, in insertion order.
    assert_eq!(samplers, vec![0, 1, 1]);

    log.clear();
    ctx.submit(&cmd).unwrap();
    assert_eq!(binds(&log), 0);
    assert_eq!(log.draws().len(), 1);

    // Swapping the textures rebinds both units.
    let swapped = Override::new()
        .uniform("uAlbedo", detail)
        .uniform("uDetail", albedo);

    log.clear();
    ctx.submit_override(&cmd, &swapped).unwrap();
    assert_eq!(binds(&log), 2);
}

#[test]
fn too_many_texture_units() {
    let (mut ctx, _) = setup(ContextParams {
        max_texture_units: Some(1),
        ..Default::default()
    });

    let albedo = texture(&mut ctx);
    let detail = texture(&mut ctx);
    let program = ctx
        .create_program(VS, FS, &["aPosition", "aTexcoord"])
        .unwrap();

    let cmd = ctx
        .command(
            CommandDescriptor::new()
                .program(program)
                .uniform("uAlbedo", albedo)
                .uniform("uDetail", detail),
        )
        .unwrap();

    match ctx.submit(&cmd) {
        Err(Error::TooManyTextureUnits(1)) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn update_program_is_atomic() {
    let (mut ctx, log) = setup(ContextParams::default());
    let program = ctx
        .create_program(VS, FS, &["aPosition", "aTexcoord"])
        .unwrap();

    let native = |log: &CallLog| {
        log.calls()
            .into_iter()
            .filter_map(|v| match v {
                Call::LinkProgram { id, .. } => Some(id),
                _ => None,
            })
            .last()
            .unwrap()
    };

    let before = native(&log);

    let broken = "void main() { gl_FragColor = vec4(1.0);";
    match ctx.update_program(program, VS, broken, &["aPosition", "aTexcoord"]) {
        Err(Error::ShaderCompile { stage, .. }) => assert_eq!(stage, ShaderStage::Fragment),
        other => panic!("unexpected {:?}", other),
    }

    assert_eq!(ctx.program(program).unwrap().id, before);
    ctx.set_uniform(program, "uMode", 1).unwrap();

    let plain = "
uniform vec4 uTint;
void main() {
    gl_FragColor = uTint;
}
";

    ctx.update_program(program, VS, plain, &["aPosition"]).unwrap();
    let after = native(&log);
    assert_ne!(after, before);
    assert_eq!(ctx.program(program).unwrap().id, after);
    assert!(log.calls().contains(&Call::DeleteProgram(before)));

    assert!(ctx.program(program).unwrap().declares("uTint"));
    match ctx.set_uniform(program, "uMode", 1) {
        Err(Error::UnknownUniform(_)) => {}
        other => panic!("unexpected {:?}", other),
    }

    log.clear();
    ctx.set_uniform(program, "uTint", [1.0f32, 1.0, 1.0, 1.0]).unwrap();
    assert_eq!(log.calls()[0], Call::UseProgram(after));
}
