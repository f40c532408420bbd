use intervalset::set::format_variant;
use intervalset::{
    DeltaCodec, Error, IntervalConfig, SeriesBuffer, SimpleFactory, SimpleInterval,
    SimpleIntervalSet, TaggedFactory, TaggedInterval, TaggedIntervalSet,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use tracing_subscriber::EnvFilter;

/// Print a usage message
fn print_usage() {
    println!("intervalset - sorted, non-overlapping integer interval sets");
    println!("Usage:");
    println!("  intervalset [OPTIONS] COMMAND [ARGS]");
    println!();
    println!("Options:");
    println!("  --cache-capacity N  Interned sequences to keep (default: 4096)");
    println!("  --cache-shards N    Cache shards (default: 16)");
    println!("  --help              Show this help message");
    println!();
    println!("Commands:");
    println!("  demo                          Build a gapped series and print its intervals");
    println!("  dump [--tagged] FILE          Print the intervals stored in FILE");
    println!("  write [--tagged] FILE SPEC..  Merge START:END[:TAG] intervals and write FILE");
    println!("  help                          Show this help message");
    println!();
    println!("Set RUST_LOG=debug to trace merges and persistence.");
}

/// Parse command line arguments
fn parse_args() -> Result<(IntervalConfig, String, Vec<String>), String> {
    let mut args = std::env::args().skip(1).collect::<Vec<_>>();

    if args.is_empty() || args.iter().any(|a| a == "--help") {
        print_usage();
        std::process::exit(0);
    }

    let mut config = IntervalConfig::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--cache-capacity" => {
                if i + 1 < args.len() {
                    config.cache_capacity = args[i + 1]
                        .parse::<usize>()
                        .map_err(|_| "Invalid cache capacity".to_string())?;
                    args.drain(i..i + 2);
                } else {
                    return Err("Missing value for --cache-capacity".to_string());
                }
            }
            "--cache-shards" => {
                if i + 1 < args.len() {
                    config.cache_shards = args[i + 1]
                        .parse::<usize>()
                        .map_err(|_| "Invalid cache shard count".to_string())?;
                    args.drain(i..i + 2);
                } else {
                    return Err("Missing value for --cache-shards".to_string());
                }
            }
            _ => {
                i += 1;
            }
        }
    }

    if args.is_empty() {
        return Err("Missing command".to_string());
    }

    let command = args.remove(0);
    Ok((config, command, args))
}

/// Split a leading `--tagged` flag from the remaining arguments
fn take_tagged(args: &[String]) -> (bool, &[String]) {
    match args.first() {
        Some(flag) if flag == "--tagged" => (true, &args[1..]),
        _ => (false, args),
    }
}

/// Parse `START:END` or `START:END:TAG`
fn parse_bounds(spec: &str) -> Result<(i64, i64, i64), Error> {
    let invalid = || {
        Error::ConfigError(format!("Invalid interval '{}', expected START:END[:TAG]", spec))
    };
    let fields = spec
        .split(':')
        .map(|f| f.trim().parse::<i64>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;
    match fields.as_slice() {
        [start, end] => Ok((*start, *end, 0)),
        [start, end, tag] => Ok((*start, *end, *tag)),
        _ => Err(invalid()),
    }
}

/// Handle demo command
fn handle_demo(config: &IntervalConfig, _args: &[String]) -> Result<(), Error> {
    let simple = SimpleFactory::with_config(config);
    let tagged = TaggedFactory::with_config(config);
    let mut buffer = SeriesBuffer::new(0, 10, simple, tagged)?;

    for (index, value) in [(0, 1), (1, 2), (4, 3), (5, 4)] {
        buffer.add_value(index, value, 1)?;
    }
    for (index, value) in [(9, 5), (10, 6)] {
        buffer.add_value(index, value, 2)?;
    }
    let series = buffer.flush();

    println!("Values: {:?}", series.values());
    println!("Valid cadences:");
    for interval in series.valid_cadences().iter() {
        println!("  {}", interval);
    }
    println!("Originators:");
    for interval in series.originators().iter() {
        println!("  {}", interval);
    }
    println!("Gap indices: {:?}", series.gap_indices());

    Ok(())
}

/// Handle dump command
fn handle_dump(config: &IntervalConfig, args: &[String]) -> Result<(), Error> {
    let (tagged, rest) = take_tagged(args);
    let path = rest
        .first()
        .ok_or_else(|| Error::ConfigError("Missing file argument".to_string()))?;

    let mut bytes = Vec::new();
    BufReader::new(File::open(path)?).read_to_end(&mut bytes)?;

    // Versioned files name their own variant; legacy files rely on --tagged.
    let tagged = match format_variant(&bytes) {
        Some(variant) => variant == TaggedInterval::VARIANT,
        None => tagged,
    };
    let versioned = format_variant(&bytes).is_some();
    let mut input = bytes.as_slice();

    let (count, listing) = if tagged {
        let factory = TaggedFactory::with_config(config);
        let set = if versioned {
            TaggedIntervalSet::read_versioned(factory, &mut input)?
        } else {
            TaggedIntervalSet::read(factory, &mut input)?
        };
        (set.len(), set.dump())
    } else {
        let factory = SimpleFactory::with_config(config);
        let set = if versioned {
            SimpleIntervalSet::read_versioned(factory, &mut input)?
        } else {
            SimpleIntervalSet::read(factory, &mut input)?
        };
        (set.len(), set.dump())
    };

    print!("{}", listing);
    println!("Total: {} intervals", count);

    Ok(())
}

/// Handle write command
fn handle_write(config: &IntervalConfig, args: &[String]) -> Result<(), Error> {
    let (tagged, rest) = take_tagged(args);
    let (path, specs) = rest
        .split_first()
        .ok_or_else(|| Error::ConfigError("Missing file argument".to_string()))?;

    let mut output = BufWriter::new(File::create(path)?);
    let count = if tagged {
        let mut set = TaggedIntervalSet::new(TaggedFactory::with_config(config));
        for spec in specs {
            let (start, end, tag) = parse_bounds(spec)?;
            set.merge_interval(TaggedInterval::try_new(start, end, tag)?);
        }
        set.write_versioned(&mut output)?;
        set.len()
    } else {
        let mut set = SimpleIntervalSet::new(SimpleFactory::with_config(config));
        for spec in specs {
            let (start, end, _) = parse_bounds(spec)?;
            set.merge_interval(SimpleInterval::try_new(start, end)?);
        }
        set.write_versioned(&mut output)?;
        set.len()
    };
    output.flush()?;

    println!("Wrote {} intervals to {}", count, path);

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let (config, command, args) = match parse_args() {
        Ok(result) => result,
        Err(err) => {
            eprintln!("Error: {}", err);
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(err) = config.validate() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }

    // Dispatch command
    let result = match command.as_str() {
        "demo" => handle_demo(&config, &args),
        "dump" => handle_dump(&config, &args),
        "write" => handle_write(&config, &args),
        "help" => {
            print_usage();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            std::process::exit(1);
        }
    };

    // Handle errors
    if let Err(err) = result {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }

    Ok(())
}
