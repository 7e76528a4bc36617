use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    Build,
    Eject,
    Start,
    Test,
}

impl Script {
    pub const ALL: [Script; 4] = [Script::Build, Script::Eject, Script::Start, Script::Test];

    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "build" => Some(Script::Build),
            "eject" => Some(Script::Eject),
            "start" => Some(Script::Start),
            "test" => Some(Script::Test),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Script::Build => "build",
            Script::Eject => "eject",
            Script::Start => "start",
            Script::Test => "test",
        }
    }

    /// Mode the script forces before doing anything else. `eject` has none.
    pub fn mode(&self) -> Option<&'static str> {
        match self {
            Script::Start => Some("development"),
            Script::Build => Some("production"),
            Script::Test => Some("test"),
            Script::Eject => None,
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The argument vector split around the first recognised script name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Known {
        runtime_args: Vec<String>,
        script: Script,
        script_args: Vec<String>,
    },
    /// No script name found; carries the first argument, if any.
    Unknown { name: Option<String> },
}

impl Invocation {
    pub fn parse(args: &[String]) -> Self {
        let found = args
            .iter()
            .enumerate()
            .find_map(|(index, arg)| Script::from_arg(arg).map(|script| (index, script)));

        match found {
            Some((index, script)) => Invocation::Known {
                runtime_args: args[..index].to_vec(),
                script,
                script_args: args[index + 1..].to_vec(),
            },
            None => Invocation::Unknown {
                name: args.first().cloned(),
            },
        }
    }
}
