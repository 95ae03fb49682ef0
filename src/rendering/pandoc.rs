//! External pandoc backend.
//!
//! Each note is rendered by one `pandoc` process:
//!
//! ```text
//! pandoc [extra args] -f markdown -t html --standalone --template T -o OUT < note.md
//! ```
//!
//! The Markdown is streamed on stdin and pandoc writes the document itself.
//! Exit code 0 means success; anything else is reported with pandoc's stderr.

use super::backend::{RenderError, RenderRequest, Renderer};
use crate::config::RendererConfig;
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

#[derive(Debug, Clone)]
pub struct PandocRenderer {
    program: String,
    args: Vec<String>,
}

impl PandocRenderer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    fn command(&self, request: &RenderRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .args(["-f", "markdown", "-t", "html", "--standalone"]);
        // Without an inherited template pandoc falls back to its default one
        if let Some(template) = request.template {
            cmd.arg("--template").arg(template);
        }
        cmd.arg("-o").arg(request.output);
        cmd
    }
}

impl Renderer for PandocRenderer {
    fn render(&self, request: &RenderRequest) -> Result<(), RenderError> {
        let mut child = self
            .command(request)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A broken pipe means the process quit before reading everything;
            // its exit status below says why.
            if let Err(e) = stdin.write_all(request.markdown)
                && e.kind() != ErrorKind::BrokenPipe
            {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e.into());
            }
        }

        let output = child.wait_with_output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(RenderError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::path::Path;
    use tempfile::TempDir;

    fn args_of(cmd: &Command) -> Vec<&OsStr> {
        cmd.get_args().collect()
    }

    #[test]
    fn command_passes_standard_arguments() {
        let renderer = PandocRenderer::new("pandoc", vec![]);
        let request = RenderRequest {
            markdown: b"",
            template: Some(Path::new("/notes/template.html")),
            output: Path::new("/docs/a.html"),
            title: "a",
        };
        let cmd = renderer.command(&request);

        assert_eq!(cmd.get_program(), "pandoc");
        assert_eq!(
            args_of(&cmd),
            vec![
                "-f",
                "markdown",
                "-t",
                "html",
                "--standalone",
                "--template",
                "/notes/template.html",
                "-o",
                "/docs/a.html",
            ]
        );
    }

    #[test]
    fn command_omits_template_when_none_inherited() {
        let renderer = PandocRenderer::new("pandoc", vec![]);
        let request = RenderRequest {
            markdown: b"",
            template: None,
            output: Path::new("out.html"),
            title: "out",
        };
        let cmd = renderer.command(&request);
        let args = args_of(&cmd);
        assert!(!args.contains(&OsStr::new("--template")));
        assert_eq!(args.last(), Some(&OsStr::new("out.html")));
    }

    #[test]
    fn extra_args_come_first() {
        let renderer = PandocRenderer::new("pandoc", vec!["--wrap=none".to_string()]);
        let request = RenderRequest {
            markdown: b"",
            template: None,
            output: Path::new("out.html"),
            title: "out",
        };
        let cmd = renderer.command(&request);
        assert_eq!(args_of(&cmd)[0], "--wrap=none");
    }

    #[test]
    fn from_config_uses_program_and_args() {
        let config = RendererConfig {
            program: "/usr/local/bin/pandoc".to_string(),
            args: vec!["--mathjax".to_string()],
            ..Default::default()
        };
        let renderer = PandocRenderer::from_config(&config);
        assert_eq!(renderer.program, "/usr/local/bin/pandoc");
        assert_eq!(renderer.args, vec!["--mathjax".to_string()]);
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let tmp = TempDir::new().unwrap();
        let renderer = PandocRenderer::new("/nonexistent/bin/pandoc", vec![]);
        let output = tmp.path().join("a.html");
        let result = renderer.render(&RenderRequest {
            markdown: b"# A",
            template: None,
            output: &output,
            title: "a",
        });
        assert!(matches!(result, Err(RenderError::Spawn { .. })));
    }

    // =========================================================================
    // Process tests with `sh` standing in for pandoc
    // =========================================================================

    /// `sh -c SCRIPT -f markdown ...`: `-f` becomes `$0`, the rest is `"$@"`.
    #[cfg(unix)]
    fn fake_pandoc(script: &str) -> PandocRenderer {
        PandocRenderer::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[cfg(unix)]
    #[test]
    fn stdin_is_streamed_to_output() {
        let tmp = TempDir::new().unwrap();
        let renderer = fake_pandoc(
            r#"while [ $# -gt 0 ]; do if [ "$1" = -o ]; then out="$2"; fi; shift; done; cat > "$out""#,
        );
        let output = tmp.path().join("a.html");

        renderer
            .render(&RenderRequest {
                markdown: b"# Hello\n\nworld\n",
                template: None,
                output: &output,
                title: "a",
            })
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "# Hello\n\nworld\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_failure_with_stderr() {
        let tmp = TempDir::new().unwrap();
        let renderer = fake_pandoc("echo 'could not parse' >&2; exit 3");
        let output = tmp.path().join("a.html");

        let err = renderer
            .render(&RenderRequest {
                markdown: b"# A",
                template: None,
                output: &output,
                title: "a",
            })
            .unwrap_err();

        match err {
            RenderError::Failed { code, stderr } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("could not parse"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(!output.exists());
    }
}
