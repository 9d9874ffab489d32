// Shell emission for generated job scripts
// Statements accumulate in lifecycle order and are rendered once into a
// single POSIX shell script. Statements are never edited after being pushed.

/// ANSI color applied to informational echo lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnsiColor {
    Red,
    Green,
    Yellow,
}

impl AnsiColor {
    fn code(self) -> &'static str {
        match self {
            AnsiColor::Red => "31;1",
            AnsiColor::Green => "32;1",
            AnsiColor::Yellow => "33;1",
        }
    }
}

/// Flags attached to an emitted command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdOptions {
    /// Print the command to the build log before running it.
    pub echo: bool,
    /// Run with elevated privileges.
    pub sudo: bool,
    /// Terminate the script if the command exits non-zero.
    pub assert: bool,
    /// Retry the command on failure via the worker-side helper.
    pub retry: bool,
    /// Wrap the command in a named, collapsible log fold.
    pub fold: Option<String>,
}

impl Default for CmdOptions {
    fn default() -> Self {
        Self {
            echo: true,
            sudo: false,
            assert: false,
            retry: false,
            fold: None,
        }
    }
}

/// A single emitted shell statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// A line passed through without echoing or decoration.
    Raw(String),
    Cmd {
        command: String,
        opts: CmdOptions,
    },
    Echo {
        message: String,
        color: Option<AnsiColor>,
    },
    Export {
        name: String,
        value: String,
        echo: bool,
    },
    /// Prints the message in red and terminates the job.
    Failure { message: String },
    If {
        branches: Vec<Branch>,
        fallback: Option<Vec<Statement>>,
    },
    Fold {
        name: String,
        body: Vec<Statement>,
    },
}

/// One `if`/`elif` arm: a POSIX test expression and its block.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub condition: String,
    pub body: Vec<Statement>,
}

/// Ordered statement buffer for one generated job script.
#[derive(Debug, Default)]
pub struct Shell {
    statements: Vec<Statement>,
}

impl Shell {
    pub fn new() -> Self {
        Self::default()
    }

    /// The statements emitted so far, in order.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn raw(&mut self, line: impl Into<String>) {
        self.statements.push(Statement::Raw(line.into()));
    }

    pub fn cmd(&mut self, command: impl Into<String>, opts: CmdOptions) {
        self.statements.push(Statement::Cmd {
            command: command.into(),
            opts,
        });
    }

    pub fn echo(&mut self, message: impl Into<String>, color: Option<AnsiColor>) {
        self.statements.push(Statement::Echo {
            message: message.into(),
            color,
        });
    }

    pub fn export(&mut self, name: &str, value: &str, echo: bool) {
        self.statements.push(Statement::Export {
            name: name.to_string(),
            value: value.to_string(),
            echo,
        });
    }

    pub fn failure(&mut self, message: impl Into<String>) {
        self.statements.push(Statement::Failure {
            message: message.into(),
        });
    }

    /// Open a conditional; the closure fills the `if` block.
    pub fn if_(&mut self, condition: &str, f: impl FnOnce(&mut Shell)) {
        let branch = Branch {
            condition: condition.to_string(),
            body: self.block(f),
        };
        self.statements.push(Statement::If {
            branches: vec![branch],
            fallback: None,
        });
    }

    /// Attach an `elif` arm to the conditional opened by the last `if_`.
    /// An elif with no open conditional starts a new one.
    pub fn elif_(&mut self, condition: &str, f: impl FnOnce(&mut Shell)) {
        let branch = Branch {
            condition: condition.to_string(),
            body: self.block(f),
        };
        match self.statements.last_mut() {
            Some(Statement::If { branches, fallback }) if fallback.is_none() => {
                branches.push(branch)
            }
            _ => self.statements.push(Statement::If {
                branches: vec![branch],
                fallback: None,
            }),
        }
    }

    /// Attach the `else` block to the conditional opened by the last `if_`.
    /// An else with no open conditional is ignored.
    pub fn else_(&mut self, f: impl FnOnce(&mut Shell)) {
        let body = self.block(f);
        if let Some(Statement::If { fallback, .. }) = self.statements.last_mut() {
            if fallback.is_none() {
                *fallback = Some(body);
            }
        }
    }

    /// Wrap the closure's statements in a named log fold.
    pub fn fold(&mut self, name: &str, f: impl FnOnce(&mut Shell)) {
        let body = self.block(f);
        self.statements.push(Statement::Fold {
            name: name.to_string(),
            body,
        });
    }

    fn block(&mut self, f: impl FnOnce(&mut Shell)) -> Vec<Statement> {
        let mut nested = Shell::new();
        f(&mut nested);
        nested.statements
    }

    /// Render the buffer into a complete shell script.
    pub fn to_script(&self) -> String {
        let mut out = String::from(PREAMBLE);
        for statement in &self.statements {
            render_statement(&mut out, statement, 0);
        }
        out
    }
}

/// Helper functions every generated script carries. The worker interprets
/// the fold markers; retry and assert are plain shell.
const PREAMBLE: &str = r#"#!/usr/bin/env bash
# Generated by buildgen. Do not edit.

buildgen_assert() {
  local result=$?
  if [ $result -ne 0 ]; then
    echo -e "\033[31;1mThe command \"$1\" failed and exited with $result.\033[0m"
    exit $result
  fi
}

buildgen_retry() {
  local result=0
  local count=1
  while [ $count -le 3 ]; do
    if [ $result -ne 0 ]; then
      echo -e "\033[33;1mThe command \"$*\" failed. Retrying, $count of 3.\033[0m"
    fi
    "$@"
    result=$?
    if [ $result -eq 0 ]; then
      break
    fi
    count=$((count + 1))
    sleep 1
  done
  if [ $count -gt 3 ]; then
    echo -e "\033[31;1mThe command \"$*\" failed 3 times.\033[0m"
  fi
  return $result
}

buildgen_fold_start() {
  echo -en "buildgen_fold:start:$1\r\033[0K"
}

buildgen_fold_end() {
  echo -en "buildgen_fold:end:$1\r\033[0K"
}

"#;

fn push_line(out: &mut String, indent: usize, line: &str) {
    for _ in 0..indent {
        out.push_str("  ");
    }
    out.push_str(line);
    out.push('\n');
}

fn render_statement(out: &mut String, statement: &Statement, indent: usize) {
    match statement {
        Statement::Raw(line) => push_line(out, indent, line),
        Statement::Echo { message, color } => {
            push_line(out, indent, &render_echo(message, *color));
        }
        Statement::Export { name, value, echo } => {
            let line = format!("export {name}={value}");
            if *echo {
                push_line(
                    out,
                    indent,
                    &format!("echo {}", single_quote(&format!("$ {line}"))),
                );
            }
            push_line(out, indent, &line);
        }
        Statement::Cmd { command, opts } => {
            if let Some(name) = &opts.fold {
                push_line(out, indent, &format!("buildgen_fold_start {name}"));
            }
            if opts.echo {
                push_line(
                    out,
                    indent,
                    &format!("echo {}", single_quote(&format!("$ {command}"))),
                );
            }
            let mut line = String::new();
            if opts.retry {
                line.push_str("buildgen_retry ");
            }
            if opts.sudo {
                line.push_str("sudo ");
            }
            line.push_str(command);
            push_line(out, indent, &line);
            if opts.assert {
                push_line(
                    out,
                    indent,
                    &format!("buildgen_assert {}", single_quote(command)),
                );
            }
            if let Some(name) = &opts.fold {
                push_line(out, indent, &format!("buildgen_fold_end {name}"));
            }
        }
        Statement::Failure { message } => {
            push_line(out, indent, &render_echo(message, Some(AnsiColor::Red)));
            push_line(out, indent, "exit 1");
        }
        Statement::If { branches, fallback } => {
            for (i, branch) in branches.iter().enumerate() {
                let keyword = if i == 0 { "if" } else { "elif" };
                push_line(
                    out,
                    indent,
                    &format!("{keyword} [[ {} ]]; then", branch.condition),
                );
                for nested in &branch.body {
                    render_statement(out, nested, indent + 1);
                }
            }
            if let Some(body) = fallback {
                push_line(out, indent, "else");
                for nested in body {
                    render_statement(out, nested, indent + 1);
                }
            }
            push_line(out, indent, "fi");
        }
        Statement::Fold { name, body } => {
            push_line(out, indent, &format!("buildgen_fold_start {name}"));
            for nested in body {
                render_statement(out, nested, indent + 1);
            }
            push_line(out, indent, &format!("buildgen_fold_end {name}"));
        }
    }
}

fn render_echo(message: &str, color: Option<AnsiColor>) -> String {
    match color {
        Some(color) => format!(
            "echo -e {}",
            single_quote(&format!("\\033[{}m{}\\033[0m", color.code(), message))
        ),
        None => format!("echo {}", single_quote(message)),
    }
}

/// Quote a string for the shell, surviving embedded single quotes.
fn single_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
