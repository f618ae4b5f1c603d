use std::collections::HashMap;
use std::fs;
use std::io::{self, Read, Write};
use std::process;

use clap::{ArgGroup, Parser};
use regex::Regex;
use tracing::{error, info};

use multipart_formdata_parser::{parse, parse_header, MultiPartFormData, Part};

#[derive(Parser)]
#[command(
    name = "multipart-formdata-parser",
    about = "Parse and filter multipart/form-data bodies",
    group(ArgGroup::new("boundary_source").required(true).args(["boundary", "content_type"]))
)]
struct Cli {
    /// Body files to parse (- for stdin, default: stdin)
    files: Vec<String>,

    /// Boundary token, without the leading --
    #[arg(short, long, value_name = "TOKEN")]
    boundary: Option<String>,

    /// Content-Type header value carrying the boundary attribute
    #[arg(short = 't', long = "content-type", value_name = "VALUE")]
    content_type: Option<String>,

    /// Match form field name by regex
    #[arg(short, long, value_name = "REGEX")]
    name: Option<String>,

    /// Match header line by regex (NAME=REGEX), repeatable
    #[arg(short = 'H', long = "header", value_name = "NAME=REGEX")]
    header: Vec<String>,

    /// Only show parts carrying a filename
    #[arg(long)]
    files_only: bool,

    /// Show part headers
    #[arg(long, group = "output_mode")]
    headers: bool,

    /// Write matching payloads to stdout, unmodified
    #[arg(long, group = "output_mode")]
    payload: bool,

    /// Re-encode matching parts as a multipart body
    #[arg(long, group = "output_mode")]
    rebuild: bool,

    /// Show statistics summary
    #[arg(long, group = "output_mode")]
    stats: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

struct CompiledFilters {
    name: Option<Regex>,
    headers: Vec<(String, Regex)>,
    files_only: bool,
}

impl CompiledFilters {
    fn matches(&self, part: &Part) -> bool {
        if self.files_only && !part.is_file() {
            return false;
        }

        if let Some(ref re) = self.name {
            match part.name() {
                Some(name) if re.is_match(name) => {}
                _ => return false,
            }
        }

        for (name, re) in &self.headers {
            let matched = part
                .headers
                .iter()
                .filter(|h| h.name.eq_ignore_ascii_case(name))
                .any(|h| re.is_match(&h.to_string()));
            if !matched {
                return false;
            }
        }

        true
    }
}

fn compile_regex(pattern: &str, label: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => {
            eprintln!("invalid {label} regex '{pattern}': {e}");
            process::exit(2);
        }
    }
}

fn compile_filters(cli: &Cli) -> CompiledFilters {
    let name = cli.name.as_ref().map(|p| compile_regex(p, "name"));

    let mut headers = Vec::new();
    for spec in &cli.header {
        let Some(eq) = spec.find('=') else {
            eprintln!("invalid header filter '{spec}': expected NAME=REGEX");
            process::exit(2);
        };
        let name = spec[..eq].to_string();
        let re = compile_regex(&spec[eq + 1..], &format!("header {name}"));
        headers.push((name, re));
    }

    CompiledFilters {
        name,
        headers,
        files_only: cli.files_only,
    }
}

/// Boundary from a `Content-Type` value such as
/// `multipart/form-data; boundary=abc; charset=utf-8`.
fn boundary_from_content_type(content_type: &str) -> Result<String, String> {
    let header = parse_header(content_type.as_bytes())
        .map_err(|e| format!("invalid content type '{content_type}': {e}"))?;
    let value = header.attribute_value("boundary").unwrap_or_default();

    // An unquoted value runs to the end of the line; the boundary stops at
    // the next parameter. A quoted one may contain `;`.
    let boundary = if content_type.contains(&format!("\"{value}\"")) {
        value
    } else {
        value.split(';').next().unwrap_or_default().trim()
    };
    if boundary.is_empty() {
        return Err(format!("content type '{content_type}' has no boundary attribute"));
    }
    Ok(boundary.to_string())
}

fn resolve_boundary(cli: &Cli) -> String {
    if let Some(ref boundary) = cli.boundary {
        return boundary.clone();
    }

    let content_type = cli.content_type.as_deref().unwrap_or_default();
    match boundary_from_content_type(content_type) {
        Ok(boundary) => boundary,
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        }
    }
}

fn read_inputs(files: &[String]) -> Vec<(String, Vec<u8>)> {
    let paths: Vec<&str> = if files.is_empty() {
        vec!["-"]
    } else {
        files.iter().map(String::as_str).collect()
    };

    let mut inputs = Vec::with_capacity(paths.len());
    for path in paths {
        let data = if path == "-" {
            let mut buf = Vec::new();
            io::stdin().lock().read_to_end(&mut buf).map(|_| buf)
        } else {
            fs::read(path)
        };
        match data {
            Ok(d) => inputs.push((path.to_string(), d)),
            Err(e) => {
                eprintln!("{path}: {e}");
                process::exit(1);
            }
        }
    }
    inputs
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.into()),
        )
        .with_writer(io::stderr)
        .init();
}

fn format_summary(index: usize, part: &Part) -> String {
    format!(
        "{index} name={} filename={} type={} {} bytes",
        part.name().unwrap_or("-"),
        part.filename().unwrap_or("-"),
        part.content_type().unwrap_or("-"),
        part.payload.len(),
    )
}

fn output_headers(index: usize, part: &Part) {
    println!("part {index} ({} bytes)", part.payload.len());
    for header in &part.headers {
        println!("{header}");
    }
}

fn output_payload(part: &Part) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(&part.payload)?;
    stdout.flush()
}

fn run_stats(forms: &[MultiPartFormData], filters: &CompiledFilters) {
    let mut type_counts: HashMap<String, usize> = HashMap::new();
    let mut total: usize = 0;
    let mut matched: usize = 0;
    let mut files: usize = 0;
    let mut payload_bytes: usize = 0;

    for part in forms.iter().flat_map(|f| &f.parts) {
        total += 1;
        if !filters.matches(part) {
            continue;
        }
        matched += 1;
        if part.is_file() {
            files += 1;
        }
        payload_bytes += part.payload.len();
        let ct = part.content_type().unwrap_or("(none)").to_ascii_lowercase();
        *type_counts.entry(ct).or_default() += 1;
    }

    println!("parts: {total}");
    println!("matched: {matched}");
    println!("files: {files}");
    println!("fields: {}", matched - files);
    println!("payload bytes: {payload_bytes}");

    let mut types: Vec<_> = type_counts.into_iter().collect();
    types.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    if !types.is_empty() {
        println!("\ncontent types:");
        for (ct, count) in &types {
            println!("  {ct}: {count}");
        }
    }
}

fn run_filtered(form: &MultiPartFormData, cli: &Cli, filters: &CompiledFilters) -> io::Result<()> {
    if cli.rebuild {
        let kept = MultiPartFormData {
            boundary: form.boundary.clone(),
            parts: form
                .parts
                .iter()
                .filter(|p| filters.matches(p))
                .cloned()
                .collect(),
        };
        let mut stdout = io::stdout().lock();
        stdout.write_all(&kept.to_bytes())?;
        return stdout.flush();
    }

    for (index, part) in form.parts.iter().enumerate() {
        if !filters.matches(part) {
            continue;
        }
        if cli.headers {
            output_headers(index, part);
        } else if cli.payload {
            output_payload(part)?;
        } else {
            println!("{}", format_summary(index, part));
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let boundary = resolve_boundary(&cli);
    let filters = compile_filters(&cli);

    let mut forms = Vec::new();
    let mut failed = false;
    for (path, data) in read_inputs(&cli.files) {
        match parse(&boundary, &data) {
            Ok(form) => {
                info!(file = %path, parts = form.len(), "parsed");
                forms.push(form);
            }
            Err(e) => {
                error!(file = %path, "parse error: {e}");
                failed = true;
            }
        }
    }

    if cli.stats {
        run_stats(&forms, &filters);
    } else {
        for form in &forms {
            if let Err(e) = run_filtered(form, &cli, &filters) {
                eprintln!("write error: {e}");
                process::exit(1);
            }
        }
    }

    if failed {
        process::exit(1);
    }
}
