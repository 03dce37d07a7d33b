use std::{collections::HashMap, path::PathBuf, process::exit, str::FromStr};

use clap::{Args, Command, FromArgMatches};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use letterspacer::{
    convertors::ruletext,
    filters::{AutoSpace, FontFilter, TabularWidth},
    Sides, SpacingError,
};

fn fail(message: &str, error: SpacingError) -> ! {
    log::error!("{}: {}", message, error);
    exit(1)
}

fn main() {
    let command = Command::new("letterspacer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Optical auto-spacing of glyph sidebearings")
        .arg(
            clap::Arg::new("font_path")
                .help("Path to the input font file (JSON)")
                .required(true)
                .index(1),
        )
        .arg(
            clap::Arg::new("output")
                .help("Path to the output font file (JSON)")
                .required(true)
                .index(2),
        )
        .arg(
            clap::Arg::new("rules")
                .long("rules")
                .value_name("FILE")
                .help("Replace the font's spacing rules with those in a rule file"),
        )
        .arg(
            clap::Arg::new("export_rules")
                .long("export-rules")
                .value_name("FILE")
                .help("Write the font's spacing rules to a rule file"),
        )
        .next_help_heading("Spacing options")
        .arg(
            clap::Arg::new("master")
                .long("master")
                .value_name("ID")
                .help("Only space this master"),
        )
        .arg(
            clap::Arg::new("tabular_width")
                .long("tabular-width")
                .value_name("WIDTH")
                .help("Width of tabular glyphs: a number, or 'average' of the spaced glyphs"),
        )
        .arg(
            clap::Arg::new("sides")
                .long("sides")
                .value_parser(["left", "right", "both"])
                .default_value("both")
                .help("Which sidebearings to set"),
        );
    let command = Verbosity::<WarnLevel>::augment_args(command);

    // Extend with the font filter arguments
    let command = letterspacer::filters::filter_group(command);

    let args = command.get_matches();
    let verbosity =
        Verbosity::<WarnLevel>::from_arg_matches(&args).unwrap_or_else(|e| e.exit());
    env_logger::Builder::new()
        .filter_level(verbosity.log_level_filter())
        .init();

    let input_name = PathBuf::from(args.get_one::<String>("font_path").cloned().unwrap_or_default());
    let output_name = PathBuf::from(args.get_one::<String>("output").cloned().unwrap_or_default());

    let sides = args
        .get_one::<String>("sides")
        .map(|s| Sides::from_str(s))
        .transpose()
        .unwrap_or_else(|e| fail("Bad --sides", e))
        .unwrap_or_default();
    let tabular_width = args
        .get_one::<String>("tabular_width")
        .map(|s| TabularWidth::from_str(s))
        .transpose()
        .unwrap_or_else(|e| fail("Bad --tabular-width", e))
        .unwrap_or_default();
    let master = args.get_one::<String>("master").cloned();

    // Clap stores --foo 1 --bar 2 --foo 3 as "foo": ["1", "3"], "bar": ["2"]; the raw
    // occurrences of the "filters" group give back the command line order.
    let mut counter = HashMap::new();
    let mut filters: Vec<Box<dyn FontFilter>> = vec![];
    for filter in args.get_raw("filters").into_iter().flatten() {
        let name = filter.to_string_lossy().to_string();
        let count = counter.entry(name.clone()).or_insert(0);
        let value = args
            .get_raw_occurrences(&name)
            .and_then(|mut occurrences| occurrences.nth(*count))
            .map(|v| v.map(|v| v.to_string_lossy()).collect::<String>())
            .unwrap_or_default();
        *count += 1;
        let filter: Box<dyn FontFilter> = if name == "autospace" {
            let mut autospace = AutoSpace::from_str(&value)
                .unwrap_or_else(|e| fail("Bad --autospace", e))
                .with_sides(sides)
                .with_tabular_width(tabular_width);
            if let Some(master) = &master {
                autospace = autospace.with_master(master);
            }
            Box::new(autospace)
        } else {
            letterspacer::filters::cli_to_filter(&name, &value)
                .unwrap_or_else(|e| fail("Bad filter", e))
        };
        filters.push(filter);
    }

    log::info!("Loading {}", input_name.display());
    let mut font = letterspacer::load(&input_name).unwrap_or_else(|e| fail("Failed to load font", e));

    if let Some(rules_path) = args.get_one::<String>("rules") {
        let report =
            ruletext::load(rules_path, &font).unwrap_or_else(|e| fail("Failed to read rules", e));
        log::info!(
            "Imported {} rules from {}: {}",
            report.rules.len(),
            rules_path,
            report.summary()
        );
        font.rules = report.rules;
    }

    if !filters.is_empty() {
        log::info!("Applying filters...");
        let before_filters = std::time::Instant::now();
        for filter in filters {
            filter
                .apply(&mut font)
                .unwrap_or_else(|e| fail("Failed to apply font filter", e));
        }
        log::info!("Applied filters in {:.2?}", before_filters.elapsed());
    }

    if let Some(export_path) = args.get_one::<String>("export_rules") {
        log::info!("Writing rules to {}", export_path);
        ruletext::save(&font.rules, export_path)
            .unwrap_or_else(|e| fail("Failed to write rules", e));
    }

    log::info!("Saving {}", output_name.display());
    font.save(output_name)
        .unwrap_or_else(|e| fail("Failed to save font", e));
}
