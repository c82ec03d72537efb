mod builder;

pub use builder::{
    NEW_MESSAGE_LABEL, REPLY_INSTRUCTION, SHORT_REPLY_INSTRUCTION, build_prompt,
    build_short_prompt,
};
