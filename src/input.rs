//! Task-set files.
//!
//! A task-set file holds one task-set per non-empty line, written as
//! `n U v T1 C1 D1 ... Tn Cn Dn`: the number of tasks, the total utilization
//! the set was generated for, the deadline flag (`0` for implicit and `1` for
//! constrained deadlines) and the period, cost and deadline of each task.

use crate::task::{DeadlineKind, TaskSet, Time, ValidationError};

use thiserror::Error;

use std::{
    io::{self, BufRead, Write},
    str::FromStr
};

/// A malformed line of a task-set file.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based line number.
    pub line: usize,
    pub kind: ParseErrorKind
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseErrorKind {
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("invalid {field} `{token}`")]
    Number { field: &'static str, token: String },
    #[error("deadline flag must be 0 or 1, found {0}")]
    Flag(u8),
    #[error("expected {expected} task parameters, found {found}")]
    Count { expected: usize, found: usize },
    #[error(transparent)]
    Invalid(#[from] ValidationError)
}

/// A task-set read from a file, with the utilization it was generated for.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub util: f64,
    pub tasks: TaskSet
}

fn field<'a, T: FromStr>(tokens: &mut impl Iterator<Item = &'a str>, name: &'static str) -> Result<T, ParseErrorKind> {
    let token = tokens.next().ok_or(ParseErrorKind::Missing(name))?;

    token.parse().map_err(|_| ParseErrorKind::Number { field: name, token: token.to_owned() })
}

/// Parses a single non-empty line of a task-set file.
pub fn parse_line(line: &str) -> Result<Entry, ParseErrorKind> {
    let mut tokens = line.split_whitespace();

    let num: usize = field(&mut tokens, "task count")?;
    let util: f64 = field(&mut tokens, "utilization")?;
    let flag: u8 = field(&mut tokens, "deadline flag")?;
    let kind = DeadlineKind::from_flag(flag).ok_or(ParseErrorKind::Flag(flag))?;

    let params = tokens.map(|token| token.parse::<Time>().map_err(|_| ParseErrorKind::Number {
        field: "task parameter", token: token.to_owned()
    })).collect::<Result<Vec<_>, _>>()?;

    if params.len() != 3 * num {
        return Err(ParseErrorKind::Count { expected: 3 * num, found: params.len() });
    }

    let tasks = TaskSet::from_triples(
        params.chunks_exact(3).map(|p| (p[0], p[1], p[2])),
        kind
    )?;

    Ok(Entry { util, tasks })
}

/// Reads every task-set from `reader`, skipping blank lines.
pub fn read_task_sets(reader: impl BufRead) -> Result<Vec<Entry>, crate::Error> {
    let mut out = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;

        if line.trim().is_empty() {
            continue;
        }

        let entry = parse_line(&line).map_err(|kind| ParseError { line: i + 1, kind })?;
        out.push(entry);
    }

    Ok(out)
}

/// Writes task-set `ts`, generated for utilization `util`, as a single line.
pub fn write_task_set(w: &mut impl Write, util: f64, ts: &TaskSet) -> io::Result<()> {
    write!(w, "{} {} {}", ts.len(), util, ts.kind().flag())?;

    for task in ts {
        write!(w, " {} {} {}", task.period, task.cost, task.deadline)?;
    }

    writeln!(w)
}
