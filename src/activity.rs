use sysinfo::System;
use tracing::debug;

use crate::types::ToolKind;

/// Number of live scanner processes per tool kind. Display metadata only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessActivity {
    pub strix: usize,
    pub nikto: usize,
    pub nmap: usize,
}

impl ProcessActivity {
    pub fn total(&self) -> usize {
        self.strix + self.nikto + self.nmap
    }

    pub fn get(&self, kind: ToolKind) -> usize {
        match kind {
            ToolKind::Strix => self.strix,
            ToolKind::Nikto => self.nikto,
            ToolKind::Nmap => self.nmap,
        }
    }

    fn bump(&mut self, kind: ToolKind) {
        match kind {
            ToolKind::Strix => self.strix += 1,
            ToolKind::Nikto => self.nikto += 1,
            ToolKind::Nmap => self.nmap += 1,
        }
    }

    /// Counts every process description that mentions a tool name, case-insensitively.
    pub fn from_descriptions<I, S>(descriptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut activity = Self::default();
        for d in descriptions {
            let d = d.as_ref().to_lowercase();
            for kind in ToolKind::ALL {
                if d.contains(kind.slug()) {
                    activity.bump(kind);
                }
            }
        }
        activity
    }
}

/// Source of process activity. Implementations degrade to zero counts instead of failing.
pub trait ActivityProbe {
    fn probe(&self) -> ProcessActivity;
}

/// Lists the host's processes through `sysinfo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemActivityProbe;

impl ActivityProbe for SystemActivityProbe {
    fn probe(&self) -> ProcessActivity {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            debug!("process listing unsupported on this platform");
            return ProcessActivity::default();
        }
        let system = System::new_all();
        let descriptions = system.processes().values().map(|p| {
            let mut line = p.name().to_string_lossy().into_owned();
            for arg in p.cmd() {
                line.push(' ');
                line.push_str(&arg.to_string_lossy());
            }
            line
        });
        let activity = ProcessActivity::from_descriptions(descriptions);
        debug!(?activity, "probed scanner processes");
        activity
    }
}
