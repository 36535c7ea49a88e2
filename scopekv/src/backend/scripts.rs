use redis::Script;
use std::sync::LazyLock;

pub const GUARDED_PUT_SCRIPT_BODY: &str = include_str!("../../lua/guarded_put.lua");

pub static GUARDED_PUT_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(GUARDED_PUT_SCRIPT_BODY));
