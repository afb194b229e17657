#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

/// Commands whose whole remainder is one free-text argument.
pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "generate",
        action: "generate",
    },
    CommandSpec {
        command: "delete",
        action: "delete_palette",
    },
];

pub(crate) const SINGLE_PATH_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "export",
    action: "export",
}];

pub(crate) const MULTI_PATH_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "theme",
    action: "theme_image",
}];

/// Commands taking a leading word followed by optional free text.
pub(crate) const HEAD_TAIL_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "logo",
        action: "logo",
    },
    CommandSpec {
        command: "login",
        action: "login",
    },
];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "save",
        action: "save_palette",
    },
    CommandSpec {
        command: "list",
        action: "list_palettes",
    },
    CommandSpec {
        command: "show",
        action: "show_palette",
    },
    CommandSpec {
        command: "ai",
        action: "toggle_ai",
    },
    CommandSpec {
        command: "check",
        action: "check",
    },
    CommandSpec {
        command: "logout",
        action: "logout",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
    CommandSpec {
        command: "exit",
        action: "quit",
    },
];

pub const CHAT_HELP_COMMANDS: &[&str] = &[
    "/generate <prompt>",
    "/save",
    "/delete <id>",
    "/list",
    "/show",
    "/ai",
    "/logo <brand> [description]",
    "/theme <image> [out]",
    "/export [path]",
    "/check",
    "/login <id> <email>",
    "/logout",
    "/quit",
];
