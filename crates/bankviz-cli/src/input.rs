//! Input collection – scenario files, interactive entry and command
//! arguments.
//!
//! Everything typed by a user is parsed here, so the kernel only ever sees
//! integers.  Non-integer or negative fields are rejected as
//! [`BankerError::Parse`] naming the offending field; wrong counts as
//! [`BankerError::Dimension`].

use std::io::{self, BufRead, Write};
use std::path::Path;

use bankviz_types::{BankerError, ProcessId, ResourceVector, Scenario};

// ─────────────────────────────────────────────────────────────────────────────
// Scenario files
// ─────────────────────────────────────────────────────────────────────────────

/// Read a `.json` or `.toml` scenario document.  Any other extension is
/// parsed as TOML.
pub fn load_scenario(path: &Path) -> Result<Scenario, BankerError> {
    let field = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|e| BankerError::Parse {
        field: field.clone(),
        value: String::new(),
        reason: format!("cannot read file: {e}"),
    })?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let mut scenario: Scenario = if is_json {
        serde_json::from_str(&raw).map_err(|e| BankerError::Parse {
            field: field.clone(),
            value: String::new(),
            reason: e.to_string(),
        })?
    } else {
        toml::from_str(&raw).map_err(|e| BankerError::Parse {
            field: field.clone(),
            value: String::new(),
            reason: e.to_string(),
        })?
    };
    if scenario.name.is_none() {
        scenario.name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
    }
    Ok(scenario)
}

/// The classic five-process, three-resource instance.
pub fn textbook_scenario() -> Scenario {
    Scenario {
        name: Some("textbook".to_string()),
        processes: Some(5),
        resources: Some(3),
        allocation: vec![
            vec![0, 1, 0],
            vec![2, 0, 0],
            vec![3, 0, 2],
            vec![2, 1, 1],
            vec![0, 0, 2],
        ],
        maximum: vec![
            vec![7, 5, 3],
            vec![3, 2, 2],
            vec![9, 0, 2],
            vec![2, 2, 2],
            vec![4, 3, 3],
        ],
        available: vec![3, 3, 2],
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Field parsers
// ─────────────────────────────────────────────────────────────────────────────

/// Largest process or resource-type count accepted from a prompt.
pub const MAX_COUNT: usize = 256;

/// Parse a count of processes or resource types in `1..=MAX_COUNT`.
pub fn parse_count(field: &str, line: &str) -> Result<usize, BankerError> {
    let value = line.trim();
    match value.parse::<usize>() {
        Ok(0) => Err(BankerError::Parse {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be at least 1".to_string(),
        }),
        Ok(n) if n > MAX_COUNT => Err(BankerError::Parse {
            field: field.to_string(),
            value: value.to_string(),
            reason: format!("must be at most {MAX_COUNT}"),
        }),
        Ok(n) => Ok(n),
        Err(e) => Err(BankerError::Parse {
            field: field.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Parse a row of `expected` non-negative integers separated by spaces
/// and/or commas.  Surrounding brackets are tolerated (`[3, 3, 2]`).
pub fn parse_row(field: &str, line: &str, expected: usize) -> Result<Vec<u32>, BankerError> {
    let row = parse_units(field, &tokens(line))?;
    if row.len() != expected {
        return Err(BankerError::Dimension {
            field: field.to_string(),
            expected,
            found: row.len(),
        });
    }
    Ok(row)
}

/// Parse a process label: `P3`, `p3` or a bare `3`.
pub fn parse_process(token: &str) -> Result<ProcessId, BankerError> {
    token.trim().parse()
}

/// Parse `/request` arguments: a process followed by one unit count per
/// resource type.
pub fn parse_request(args: &[&str]) -> Result<(ProcessId, ResourceVector), BankerError> {
    let (first, rest) = args.split_first().ok_or_else(|| BankerError::Parse {
        field: "request".to_string(),
        value: String::new(),
        reason: "expected a process followed by unit counts".to_string(),
    })?;
    let process = parse_process(first)?;
    let units: Vec<String> = rest.iter().flat_map(|arg| tokens(arg)).collect();
    Ok((process, ResourceVector::new(parse_units("request", &units)?)))
}

/// Parse an execution order such as `P1 P3 P4`, `1,3,4` or `P1 -> P3 -> P4`.
pub fn parse_order(args: &[&str]) -> Result<Vec<ProcessId>, BankerError> {
    args.iter()
        .flat_map(|arg| tokens(arg))
        .filter(|token| token != "->")
        .map(|token| parse_process(&token))
        .collect()
}

fn tokens(line: &str) -> Vec<String> {
    line.split(|c: char| c.is_whitespace() || c == ',' || c == '[' || c == ']')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_units(field: &str, tokens: &[String]) -> Result<Vec<u32>, BankerError> {
    tokens
        .iter()
        .map(|token| {
            token.parse::<u32>().map_err(|e| BankerError::Parse {
                field: field.to_string(),
                value: token.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Interactive entry
// ─────────────────────────────────────────────────────────────────────────────

/// Walk the user through n, m and every row.  Bad rows are re-prompted.
///
/// Returns `Ok(None)` when the input ends before the scenario is complete.
pub fn collect_scenario<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
) -> io::Result<Option<Scenario>> {
    let Some(n) = prompt_until(input, out, "  Processes: ", |line| {
        parse_count("processes", line)
    })?
    else {
        return Ok(None);
    };
    let Some(m) = prompt_until(input, out, "  Resource types: ", |line| {
        parse_count("resources", line)
    })?
    else {
        return Ok(None);
    };

    writeln!(out, "  Enter {m} integers per row.")?;
    let mut allocation = Vec::new();
    for i in 0..n {
        let field = format!("allocation[P{i}]");
        let prompt = format!("  Allocation P{i}: ");
        match prompt_until(input, out, &prompt, |line| parse_row(&field, line, m))? {
            Some(row) => allocation.push(row),
            None => return Ok(None),
        }
    }
    let mut maximum = Vec::new();
    for i in 0..n {
        let field = format!("maximum[P{i}]");
        let prompt = format!("  Max        P{i}: ");
        match prompt_until(input, out, &prompt, |line| parse_row(&field, line, m))? {
            Some(row) => maximum.push(row),
            None => return Ok(None),
        }
    }
    let Some(available) = prompt_until(input, out, "  Available:      ", |line| {
        parse_row("available", line, m)
    })?
    else {
        return Ok(None);
    };

    Ok(Some(Scenario {
        name: Some("interactive".to_string()),
        processes: Some(n),
        resources: Some(m),
        allocation,
        maximum,
        available,
    }))
}

fn prompt_until<R, W, T, F>(
    input: &mut R,
    out: &mut W,
    prompt: &str,
    mut parse: F,
) -> io::Result<Option<T>>
where
    R: BufRead,
    W: Write,
    F: FnMut(&str) -> Result<T, BankerError>,
{
    loop {
        write!(out, "{prompt}")?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match parse(&line) {
            Ok(value) => return Ok(Some(value)),
            Err(e) => writeln!(out, "  {e} – try again")?,
        }
    }
}
