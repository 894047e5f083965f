use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::{debug, error, warn};

use crate::errors::{Error, Result};

/// The four steps of the local extraction pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ExtractWay,
    ExtractNodes,
    Merge,
    AddLocations,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::ExtractWay => "extract_way",
            Stage::ExtractNodes => "extract_nodes",
            Stage::Merge => "merge",
            Stage::AddLocations => "add_locations",
        }
    }

    pub fn subcommand(self) -> &'static str {
        match self {
            Stage::ExtractWay | Stage::ExtractNodes => "getid",
            Stage::Merge => "merge",
            Stage::AddLocations => "add-locations-to-ways",
        }
    }
}

/// `getid` exits with this code when some requested ids are not in the input.
/// The objects it did find are still written.
const GETID_IDS_MISSING: i32 = 1;

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct Invocation {
    pub stage: Stage,
    pub inputs: Vec<OsString>,
    pub options: Vec<OsString>,
    pub output: PathBuf,
}

impl Invocation {
    pub fn new(stage: Stage, inputs: Vec<OsString>, output: PathBuf) -> Invocation {
        Invocation {
            stage,
            inputs,
            options: Vec::new(),
            output,
        }
    }

    pub fn with_option(mut self, option: &str) -> Invocation {
        self.options.push(option.into());
        self
    }

    /// `<subcommand> <inputs...> <options...> -f osm -o <output> --overwrite`
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![self.stage.subcommand().into()];
        args.extend(self.inputs.iter().cloned());
        args.extend(self.options.iter().cloned());
        args.push("-f".into());
        args.push("osm".into());
        args.push("-o".into());
        args.push(self.output.clone().into_os_string());
        args.push("--overwrite".into());
        args
    }
}

/// Runs one stage of the extraction pipeline. Implementations must write the
/// stage result to `invocation.output` or fail.
pub trait OsmTool {
    fn ensure_available(&mut self) -> Result<()> {
        Ok(())
    }

    fn run(&mut self, invocation: &Invocation) -> Result<()>;
}

/// The `osmium` command line tool.
pub struct Osmium {
    program: String,
}

impl Osmium {
    pub fn new(program: &str) -> Osmium {
        Osmium {
            program: program.to_string(),
        }
    }

    fn spawn_error(&self, err: io::Error) -> Error {
        if err.kind() == io::ErrorKind::NotFound {
            Error::ToolNotFound {
                program: self.program.clone(),
            }
        } else {
            err.into()
        }
    }
}

impl OsmTool for Osmium {
    fn ensure_available(&mut self) -> Result<()> {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|err| self.spawn_error(err))?;
        Ok(())
    }

    fn run(&mut self, invocation: &Invocation) -> Result<()> {
        let args = invocation.args();
        debug!(stage = invocation.stage.name(), arg_count = args.len(); "Running osmium");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| self.spawn_error(err))?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        check_exit(invocation, output.status.code(), stderr)
    }
}

/// Maps the exit code of a stage to its outcome. A `getid` run that only
/// missed some ids is not a failure: the caller decides from the written
/// document whether the way or its nodes are missing.
pub fn check_exit(invocation: &Invocation, exit_code: Option<i32>, stderr: String) -> Result<()> {
    let stage = invocation.stage;
    match exit_code {
        Some(0) => Ok(()),
        Some(GETID_IDS_MISSING) if stage.subcommand() == "getid" && invocation.output.is_file() => {
            warn!(stage = stage.name(), stderr = stderr.as_str(); "Some requested ids were not found");
            Ok(())
        },
        _ => {
            error!(
                stage = stage.name(),
                exit_code = exit_code.unwrap_or(-1),
                stderr = stderr.as_str();
                "Osmium exited with error"
            );
            Err(Error::ExtractionTool {
                stage,
                exit_code,
                stderr,
            })
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter().map(|arg| arg.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_getid_args() {
        let invocation = Invocation::new(
            Stage::ExtractWay,
            vec!["map.osm.pbf".into(), "w123".into()],
            PathBuf::from("/tmp/way.osm"),
        );
        assert_eq!(
            strings(invocation.args()),
            vec!["getid", "map.osm.pbf", "w123", "-f", "osm", "-o", "/tmp/way.osm", "--overwrite"]
        );
    }

    #[test]
    fn test_options_follow_inputs() {
        let invocation = Invocation::new(
            Stage::AddLocations,
            vec!["merged.osm".into()],
            PathBuf::from("located.osm"),
        ).with_option("--ignore-missing-nodes");

        let args = strings(invocation.args());
        assert_eq!(args[0], "add-locations-to-ways");
        assert_eq!(args[1], "merged.osm");
        assert_eq!(args[2], "--ignore-missing-nodes");
    }

    #[test]
    fn test_getid_with_missing_ids_is_not_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nodes.osm");
        std::fs::write(&output, "<osm version=\"0.6\"/>").unwrap();

        for stage in [Stage::ExtractWay, Stage::ExtractNodes] {
            let invocation = Invocation::new(stage, vec![], output.clone());
            assert!(check_exit(&invocation, Some(1), "Did not find 1 object(s).".to_string()).is_ok());
        }
    }

    #[test]
    fn test_getid_without_output_fails() {
        let dir = tempfile::tempdir().unwrap();
        let invocation = Invocation::new(Stage::ExtractWay, vec![], dir.path().join("way.osm"));

        let result = check_exit(&invocation, Some(1), "Open failed".to_string());
        assert!(matches!(
            result,
            Err(Error::ExtractionTool { stage: Stage::ExtractWay, exit_code: Some(1), .. })
        ));
    }

    #[test]
    fn test_other_failures_are_stage_errors() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("merged.osm");
        std::fs::write(&output, "<osm/>").unwrap();

        let merge = Invocation::new(Stage::Merge, vec![], output.clone());
        assert!(matches!(
            check_exit(&merge, Some(1), String::new()),
            Err(Error::ExtractionTool { stage: Stage::Merge, .. })
        ));

        let getid = Invocation::new(Stage::ExtractNodes, vec![], output);
        assert!(check_exit(&getid, Some(2), String::new()).is_err());
        assert!(matches!(
            check_exit(&getid, None, String::new()),
            Err(Error::ExtractionTool { exit_code: None, .. })
        ));
    }

    #[test]
    fn test_missing_binary() {
        let mut tool = Osmium::new("follow-lane-no-such-binary");
        assert!(matches!(tool.ensure_available(), Err(Error::ToolNotFound { .. })));

        let invocation = Invocation::new(Stage::Merge, vec![], PathBuf::from("out.osm"));
        assert!(matches!(tool.run(&invocation), Err(Error::ToolNotFound { .. })));
    }
}
