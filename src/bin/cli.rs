use std::io::{self, Write};
use std::str::FromStr;

use capacity_forecast::{
    AllocationOptions, AllocationResult, CapacityMode, EngineConfig, GroupBy, Horizon,
    MediaTypeFilter, RankBy, ResourceType, Snapshot, WindowGranularity, compute_allocations,
    export_result_to_csv, export_result_to_json, load_snapshot_from_csv, load_snapshot_from_json,
    logging,
};
use chrono::NaiveDate;
use polars::prelude::{AnyValue, DataFrame};

fn cell_text(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Float64(v) => format!("{v:.2}"),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::Boolean(v) => if *v { "yes".to_string() } else { String::new() },
        AnyValue::String(s) => s.to_string(),
        other => other.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| col.get(row_idx).map(|av| cell_text(&av)).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |values: &[String]| {
        let mut line = String::from("|");
        for (ci, value) in values.iter().enumerate() {
            line.push(' ');
            line.push_str(value);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(value.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  load json <path>                   Load a snapshot from JSON\n  load csv <resources> <tasks> [teams]\n                                     Load a snapshot from CSV files\n  ref <YYYY-MM-DD>                   Set the reference date (default: today)\n  windows <n>                        Set the number of windows\n  granularity day|week|month         Set the window size\n  custom <YYYY-MM-DD> <YYYY-MM-DD>   Use one custom window\n  group none|resource|team|media_type|resource_type\n                                     Set the grouping dimension\n  capacity per_window|horizon_total  Set the capacity mode\n  filter type|media|team <value>     Add a resource filter\n  filter clear                       Remove all filters\n  overallocated on|off               Show only overallocated buckets\n  rank asc|desc|none                 Rank buckets by utilization\n  top <k|all>                        Limit the number of buckets\n  unassigned on|off                  Include unassigned work\n  config <path>                      Load engine configuration from JSON\n  compute                            Compute and show allocations\n  warnings                           Show data-quality warnings of the last run\n  export csv|json <path>             Export the last result\n  quit|exit                          Exit"
    );
}

fn parse_date(input: Option<&str>) -> Option<NaiveDate> {
    input.and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

fn parse_switch(input: Option<&str>) -> Option<bool> {
    match input.map(|s| s.to_ascii_lowercase()) {
        Some(s) if s == "on" => Some(true),
        Some(s) if s == "off" => Some(false),
        _ => None,
    }
}

struct Session {
    snapshot: Snapshot,
    config: EngineConfig,
    options: AllocationOptions,
    last: Option<AllocationResult>,
}

impl Session {
    fn new() -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            snapshot: Snapshot::default(),
            config: EngineConfig::default(),
            options: AllocationOptions::new(Horizon::weeks(today, 4)),
            last: None,
        }
    }

    fn set_granularity(&mut self, granularity: WindowGranularity) {
        self.options.horizon.granularity = granularity;
    }

    fn loaded(&mut self, snapshot: Snapshot, source: &str) {
        println!(
            "Snapshot loaded from {source} ({} resources, {} tasks, {} teams).",
            snapshot.resources.len(),
            snapshot.tasks.len(),
            snapshot.teams.len()
        );
        self.snapshot = snapshot;
        self.last = None;
    }
}

fn main() {
    logging::init();
    let mut session = Session::new();

    println!("Capacity Forecast (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "load" => match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some("json"), Some(path), None, None) => match load_snapshot_from_json(path) {
                    Ok(snapshot) => session.loaded(snapshot, path),
                    Err(e) => println!("Load error: {}", e),
                },
                (Some("csv"), Some(resources), Some(tasks), teams) => {
                    match load_snapshot_from_csv(resources, tasks, teams) {
                        Ok(snapshot) => session.loaded(snapshot, tasks),
                        Err(e) => println!("Load error: {}", e),
                    }
                }
                _ => println!("Usage: load json <path> | load csv <resources> <tasks> [teams]"),
            },
            "ref" => match parse_date(parts.next()) {
                Some(date) => {
                    session.options.horizon.reference_date = date;
                    println!("Reference date set to {date}.");
                }
                None => println!("Usage: ref <YYYY-MM-DD>"),
            },
            "windows" => match parts.next().map(str::parse::<i64>) {
                Some(Ok(count)) => {
                    session.options.horizon.window_count = count;
                    println!("Window count set to {count}.");
                }
                _ => println!("Usage: windows <n>"),
            },
            "granularity" => match parts.next().map(WindowGranularity::from_str) {
                Some(Ok(granularity)) => {
                    session.set_granularity(granularity);
                    println!("Granularity set.");
                }
                Some(Err(e)) => println!("Error: {}", e),
                None => println!("Usage: granularity day|week|month"),
            },
            "custom" => match (parse_date(parts.next()), parse_date(parts.next())) {
                (Some(start), Some(end)) => {
                    session.set_granularity(WindowGranularity::Custom { start, end });
                    println!("Custom window {start}..{end} set.");
                }
                _ => println!("Usage: custom <YYYY-MM-DD> <YYYY-MM-DD>"),
            },
            "group" => match parts.next().map(GroupBy::from_str) {
                Some(Ok(group_by)) => {
                    session.options.group_by = group_by;
                    println!("Grouping set.");
                }
                Some(Err(e)) => println!("Error: {}", e),
                None => println!("Usage: group none|resource|team|media_type|resource_type"),
            },
            "capacity" => match parts.next().map(CapacityMode::from_str) {
                Some(Ok(mode)) => {
                    session.options.capacity_mode = mode;
                    println!("Capacity mode set.");
                }
                Some(Err(e)) => println!("Error: {}", e),
                None => println!("Usage: capacity per_window|horizon_total"),
            },
            "filter" => {
                let filters = &mut session.options.filters;
                match (parts.next(), parts.next()) {
                    (Some("clear"), None) => {
                        *filters = Default::default();
                        println!("Filters cleared.");
                    }
                    (Some("type"), Some(value)) => match ResourceType::from_str(value) {
                        Ok(kind) => {
                            filters.resource_type = Some(kind);
                            println!("Filter type={kind} added.");
                        }
                        Err(e) => println!("Error: {}", e),
                    },
                    (Some("media"), Some(value)) => {
                        filters.media_type = Some(MediaTypeFilter::from(value.to_string()));
                        println!("Filter media={value} added.");
                    }
                    (Some("team"), Some(value)) => {
                        filters.team_id = Some(value.to_string());
                        println!("Filter team={value} added.");
                    }
                    _ => println!("Usage: filter type|media|team <value> | filter clear"),
                }
            }
            "overallocated" => match parse_switch(parts.next()) {
                Some(on) => {
                    session.options.filters.overallocated_only = on;
                    println!("Overallocated-only {}.", if on { "on" } else { "off" });
                }
                None => println!("Usage: overallocated on|off"),
            },
            "rank" => match parts.next() {
                Some("none") => {
                    session.options.rank_by = None;
                    println!("Ranking disabled.");
                }
                Some(value) => match RankBy::from_str(value) {
                    Ok(rank_by) => {
                        session.options.rank_by = Some(rank_by);
                        println!("Ranking set.");
                    }
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Usage: rank asc|desc|none"),
            },
            "top" => match parts.next() {
                Some("all") => {
                    session.options.top_k = None;
                    println!("Showing all buckets.");
                }
                Some(value) => match value.parse::<usize>() {
                    Ok(k) => {
                        session.options.top_k = Some(k);
                        println!("Showing top {k} buckets.");
                    }
                    Err(_) => println!("Invalid count"),
                },
                None => println!("Usage: top <k|all>"),
            },
            "unassigned" => match parse_switch(parts.next()) {
                Some(on) => {
                    session.options.include_unassigned = on;
                    println!("Unassigned work {}.", if on { "on" } else { "off" });
                }
                None => println!("Usage: unassigned on|off"),
            },
            "config" => match parts.next() {
                Some(path) => match EngineConfig::load_from_json(path) {
                    Ok(config) => match config.validate() {
                        Ok(()) => {
                            session.config = config;
                            println!("Configuration loaded from {path}.");
                        }
                        Err(e) => println!("Error: {}", e),
                    },
                    Err(e) => println!("Load error: {}", e),
                },
                None => println!("Usage: config <path>"),
            },
            "compute" => {
                match compute_allocations(&session.snapshot, &session.options, &session.config) {
                    Ok(result) => {
                        match result.to_dataframe() {
                            Ok(df) => println!(
                                "Computed ({})\n{}",
                                result.summary.to_cli_summary(),
                                render_df_as_text_table(&df)
                            ),
                            Err(e) => println!("Render error: {}", e),
                        }
                        if !result.warnings.is_empty() {
                            println!(
                                "{} task(s) skipped; type 'warnings' for details.",
                                result.warnings.len()
                            );
                        }
                        session.last = Some(result);
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "warnings" => match &session.last {
                Some(result) if result.warnings.is_empty() => println!("No warnings."),
                Some(result) => {
                    for warning in &result.warnings {
                        println!("  [{}] {}", warning.task_id, warning.message);
                    }
                }
                None => println!("Nothing computed yet."),
            },
            "export" => {
                let Some(result) = &session.last else {
                    println!("Nothing computed yet.");
                    continue;
                };
                let outcome = match (parts.next(), parts.next()) {
                    (Some("csv"), Some(path)) => Some((export_result_to_csv(result, path), path)),
                    (Some("json"), Some(path)) => Some((export_result_to_json(result, path), path)),
                    _ => None,
                };
                match outcome {
                    Some((Ok(()), path)) => println!("Result exported to {path}."),
                    Some((Err(e), _)) => println!("Export error: {}", e),
                    None => println!("Usage: export csv|json <path>"),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
