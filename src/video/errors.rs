use super::assets::prelude::*;
use super::command::CommandId;

#[derive(Debug, Clone, Fail)]
pub enum Error {
    #[fail(display = "Backend: {}", _0)]
    Backend(String),
    #[fail(display = "Invalid context params: {}", _0)]
    InvalidParams(String),

    #[fail(display = "Unknown command key \"{}\".", _0)]
    UnknownCommandKey(String),
    #[fail(display = "Command field \"{}\" expects {}.", key, expected)]
    InvalidCommandField { key: String, expected: &'static str },
    #[fail(display = "Command with shader sources requires vertexLayout or attributes.")]
    MissingVertexLayout,
    #[fail(display = "Command has no {} shader source.", _0)]
    MissingShaderStage(ShaderStage),
    #[fail(display = "Attribute \"{}\" is malformed: {}.", name, reason)]
    MalformedAttribute { name: String, reason: String },
    #[fail(display = "Attribute location {} is used more than once.", _0)]
    DuplicateAttributeLocation(u32),

    #[fail(display = "Failed to compile {} shader:\n{}", stage, log)]
    ShaderCompile {
        stage: ShaderStage,
        log: String,
        source: String,
    },
    #[fail(display = "Failed to link program:\n{}", log)]
    ProgramLink { log: String },
    #[fail(display = "Attribute \"{}\" is not present in program.", _0)]
    AttributeUndefined(String),

    #[fail(display = "Uniform \"{}\" is not defined.", _0)]
    UnknownUniform(String),
    #[fail(
        display = "Wrong number of arguments for uniform \"{}\": expected {}, got {}.",
        name, expected, actual
    )]
    Arity {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[fail(
        display = "Uniform \"{}\" of type {:?} can not be set from {}.",
        name, expected, actual
    )]
    UniformTypeMismatch {
        name: String,
        expected: UniformType,
        actual: &'static str,
    },
    #[fail(
        display = "Uniform \"{}\" has unsupported type 0x{:X}.",
        name, code
    )]
    UnsupportedUniformType { name: String, code: u32 },
    #[fail(display = "Too many texture units, the limit is {}.", _0)]
    TooManyTextureUnits(u32),

    #[fail(display = "Command {} draws without an active program.", _0)]
    NoActiveProgram(CommandId),
    #[fail(display = "Command {} draws without {}.", id, missing)]
    IncompleteDraw { id: CommandId, missing: &'static str },
    #[fail(display = "Vertex attribute \"{}\" has no backing buffer.", _0)]
    MissingVertexData(String),

    #[fail(display = "Invalid data for {}: {}.", resource, reason)]
    InvalidData { resource: String, reason: String },
    #[fail(display = "Data contains a non-finite value at index {}.", index)]
    DataIntegrity { index: usize },
    #[fail(display = "Out of bounds.")]
    OutOfBounds,

    #[fail(display = "{} is invalid.", _0)]
    BufferHandleInvalid(BufferHandle),
    #[fail(display = "{} is invalid.", _0)]
    TextureHandleInvalid(TextureHandle),
    #[fail(display = "{} is invalid.", _0)]
    FramebufferHandleInvalid(FramebufferHandle),
    #[fail(display = "{} is invalid.", _0)]
    ProgramHandleInvalid(ProgramHandle),

    #[fail(display = "Framebuffer is incomplete: {}", _0)]
    FramebufferIncomplete(String),
    #[fail(display = "Too many color attachments, the limit is {}.", _0)]
    TooManyColorAttachments(u32),
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl From<::serde_json::Error> for Error {
    fn from(err: ::serde_json::Error) -> Error {
        Error::InvalidParams(format!("{}", err))
    }
}
