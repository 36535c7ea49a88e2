use crate::commands::{check, environment, organization};

#[derive(Clone, Copy)]
pub struct ExampleGroup {
    pub title: &'static str,
    pub commands: &'static [&'static str],
}

#[derive(Clone, Copy)]
pub struct CommandExample {
    pub name: &'static str,
    pub groups: &'static [ExampleGroup],
}

pub fn command_examples() -> &'static [CommandExample] {
    &[
        CommandExample {
            name: "organization",
            groups: organization::EXAMPLES,
        },
        CommandExample {
            name: "environment",
            groups: environment::EXAMPLES,
        },
        CommandExample {
            name: "check",
            groups: check::EXAMPLES,
        },
    ]
}
