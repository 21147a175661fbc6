use std::collections::{HashMap, HashSet};

/// Barebones `--key=value` flag parsing. Complains loudly about anything
/// misspelled or leftover, which beats silently ignoring a typo'd flag.
pub struct CmdArgs {
    kv: HashMap<String, String>,
    bits: HashSet<String>,
}

impl CmdArgs {
    pub fn new() -> CmdArgs {
        let mut args = CmdArgs {
            kv: HashMap::new(),
            bits: HashSet::new(),
        };
        for arg in std::env::args().skip(1) {
            let parts: Vec<&str> = arg.splitn(2, '=').collect();
            if parts.len() == 1 {
                if !arg.starts_with("--") {
                    panic!("Unexpected positional argument {}", arg);
                }
                args.bits.insert(arg);
            } else {
                args.kv.insert(parts[0].to_string(), parts[1].to_string());
            }
        }
        args
    }

    pub fn required(&mut self, key: &str) -> String {
        self.kv
            .remove(key)
            .unwrap_or_else(|| panic!("Missing required arg {}", key))
    }

    pub fn optional(&mut self, key: &str) -> Option<String> {
        self.kv.remove(key)
    }

    pub fn enabled(&mut self, key: &str) -> bool {
        self.bits.remove(key)
    }

    pub fn done(self) {
        if !self.kv.is_empty() {
            panic!("Unused arguments: {:?}", self.kv.keys().collect::<Vec<_>>());
        }
        if !self.bits.is_empty() {
            panic!("Unused arguments: {:?}", self.bits);
        }
    }
}
