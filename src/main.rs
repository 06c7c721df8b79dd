//! # threadpack CLI
//!
//! Command-line interface for the threadpack library.

use std::path::Path;
use std::process;
use std::time::Instant;

use clap::Parser as ClapParser;
use tracing_subscriber::EnvFilter;

use threadpack::cli::Args;
use threadpack::core::{FilterConfig, ImportStats, apply_filters};
use threadpack::detect::detect_source;
use threadpack::format::{OutputFormat, write_to_format};
use threadpack::reader::{Source, create_reader};
use threadpack::{ErrorCode, ThreadpackError};

fn main() {
    let args = <Args as ClapParser>::parse();
    init_logging(&args);

    if let Err(e) = run(&args) {
        eprintln!("❌ Error: {} [{}]", e, ErrorCode::from(&e));
        process::exit(1);
    }
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<(), ThreadpackError> {
    let total_start = Instant::now();
    let input = Path::new(&args.input);
    let contacts = args.contacts.as_deref().map(Path::new);
    let output_path = args.output_path();
    let format: OutputFormat = args.format.into();

    let source = match args.source.source() {
        Some(source) => source,
        None => detect_source(input)?,
    };
    if source == Source::ChatClient && !cfg!(feature = "sqlite") {
        return Err(ThreadpackError::invalid_format(
            "chat database",
            "chat client databases require the `sqlite` feature",
        ));
    }

    // Print header
    println!("📦 threadpack v{}", env!("CARGO_PKG_VERSION"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📖 Source:   {}", source);
    println!("📂 Input:    {}", args.input);
    if let Some(path) = &args.contacts {
        println!("📇 Contacts: {}", path);
    }
    println!("💾 Output:   {}", output_path);
    println!("📄 Format:   {}", format);

    let mut filter_config = FilterConfig::new();
    if let Some(after) = &args.after {
        filter_config = filter_config.with_date_from(after)?;
        println!("📅 After:    {}", after);
    }
    if let Some(before) = &args.before {
        filter_config = filter_config.with_date_to(before)?;
        println!("📅 Before:   {}", before);
    }
    if let Some(direction) = args.direction {
        filter_config = filter_config.with_direction(direction.into());
        println!("↔️  Direction: {}", threadpack::Direction::from(direction));
    }
    if let Some(contact) = &args.contact {
        filter_config = filter_config.with_contact(contact.clone());
        println!("👤 Contact:  {}", contact);
    }
    println!();

    // Step 1: Import
    let mut reader = create_reader(source);
    println!("⏳ Reading {}...", reader.name());
    let parse_start = Instant::now();
    let summary = reader.import(input, contacts)?;
    println!(
        "   Found {} messages in {} threads ({:.2}s)",
        summary.messages,
        summary.threads,
        parse_start.elapsed().as_secs_f64()
    );
    if summary.skipped > 0 {
        println!("   Skipped {} unreadable records", summary.skipped);
    }
    if !summary.status.is_success() {
        println!("⚠️  {}", summary.status);
    }

    // Step 2: Filter
    let threads = reader.threads().to_vec();
    let threads = if filter_config.is_active() {
        println!("🔍 Filtering threads...");
        let filtered = apply_filters(threads, &filter_config);
        println!("   {} threads after filtering", filtered.len());
        filtered
    } else {
        threads
    };

    // Step 3: Write
    println!("💾 Writing {}...", format);
    let write_start = Instant::now();
    write_to_format(&threads, &output_path, format)?;
    println!("   Written in {:.2}s", write_start.elapsed().as_secs_f64());

    println!();
    println!("✅ Done! Output saved to {}", output_path);

    let stats = ImportStats::from_threads(&threads);
    println!();
    println!("📊 Summary:");
    println!("   Threads:    {}", stats.threads);
    println!("   Messages:   {}", stats.messages);
    println!("   Sent:       {}", stats.sent);
    println!("   Received:   {}", stats.received);
    if stats.drafts > 0 {
        println!("   Drafts:     {}", stats.drafts);
    }
    println!("   Multimedia: {}", stats.multimedia);

    println!();
    println!("⚡ Performance:");
    println!("   Total time:  {:.2}s", total_start.elapsed().as_secs_f64());

    Ok(())
}
