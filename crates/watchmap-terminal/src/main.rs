use std::io::Write;

use watchmap::progress::FileBackend;
use watchmap::render::SvgSurface;
use watchmap::{Controller, GraphIndex, NodeState, ProgressStore, Renderer, WatchmapConfig};

type Watchmap = Controller<FileBackend, SvgSurface>;

const DEFAULT_OUTPUT: &str = "watchmap.svg";

fn main() {
	let mut opts;

	/* Parse console input */
	let parsed_options = {
		let args: Vec<String> = std::env::args().collect();

		opts = getopts::Options::new();
		opts.optflag("h", "help",       "Show help");
		opts.optflag("v", "verbose",    "Increased verbosity");
		opts.optopt( "c", "catalog",    "Catalog file to load", "PATH");
		opts.optopt( "o", "output",     "Where to write the rendered map", "PATH");
		opts.optopt( "d", "data-dir",   "Directory progress is saved in", "DIR");
		opts.parsing_style(getopts::ParsingStyle::FloatingFrees);

		let parsed_options = match opts.parse(&args[1..]) {
			Ok(m)  => { m }
			Err(e) => { println!("Unable to parse options: {}", e); return }
		};

		if parsed_options.opt_present("h") {
			let brief = "Usage: watchmap-terminal [options] [status | toggle <id> | click <id> | mark-all | clear | render]";
			eprintln!("{}", opts.usage(brief));
			return;
		}

		parsed_options
	};

	let level = if parsed_options.opt_present("v") { "debug" } else { "info" };
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

	if let Err(e) = run(&parsed_options) {
		log::error!("{}", e);
		std::process::exit(1);
	}
}

fn run(options: &getopts::Matches) -> Result<(), Error> {
	let mut config = WatchmapConfig::load_from_disk().unwrap_or_else(|e| {
		log::warn!("Failed to read config file: {}", e);
		log::warn!("Using default config.");
		WatchmapConfig::default()
	});
	if let Some(dir) = options.opt_str("d") {
		config.set_data_dir(dir.into());
	}

	let mut controller = open(&config, options.opt_str("c"))?;

	let command = options.free.first().map(String::as_str).unwrap_or("status");
	match command {
		"status" => print_status(&controller),
		"toggle" => {
			let id = options.free.get(1).ok_or(Error::MissingArgument("item id"))?;
			match controller.toggle_watched(id)? {
				Some(watched) => println!("{} is now {}", id, if watched { "watched" } else { "unwatched" }),
				None => return Err(Error::UnknownItem(id.clone())),
			}
		},
		"click" => {
			let id = options.free.get(1).ok_or(Error::MissingArgument("item id"))?;
			if !controller.index().contains(id) {
				return Err(Error::UnknownItem(id.clone()))
			}
			if !controller.renderer().is_interactive(id) {
				println!("{} is locked.", id);
			} else if !controller.click(id, &mut prompt_confirm)? {
				println!("Nothing changed.");
			}
		},
		"mark-all" => controller.mark_all_watched()?,
		"clear" => controller.clear_all()?,
		"render" => {},
		other => return Err(Error::UnknownCommand(other.to_string())),
	}

	let output = options.opt_str("o").or_else(|| (command == "render").then(|| DEFAULT_OUTPUT.to_string()));
	if let Some(output) = output {
		controller.renderer().surface().save_to_file(&output)?;
		println!("Map written to {}", output);
	}

	Ok(())
}

fn open(config: &WatchmapConfig, catalog_override: Option<String>) -> Result<Watchmap, Error> {
	let catalog_path = catalog_override
		.map(std::path::PathBuf::from)
		.or_else(|| config.catalog_path().cloned())
		.ok_or(Error::MissingArgument("catalog path, pass --catalog or set catalog_path in the config"))?;

	let catalog = watchmap::Catalog::load_from_file(&catalog_path)?;
	let index = GraphIndex::new(catalog)?;
	log::debug!("Indexed {} items", index.len());

	let store = ProgressStore::load(FileBackend::new(config.data_dir()), config.storage_key());

	let metrics = *config.layout();
	let renderer = Renderer::new(SvgSurface::new(metrics.node_size()), metrics)
		.with_image_dir(config.image_dir());

	let mut controller = Controller::new(index, store, renderer);
	controller.refresh();
	Ok(controller)
}

fn print_status(controller: &Watchmap) {
	let summary = controller.summary();
	println!(
		"Watched {} of {}, unlocked up to phase {}",
		summary.watched, summary.total, controller.highest_unlocked_phase()
	);

	let eval = controller.evaluator();
	for item in eval.visible_items() {
		let marker = match eval.node_state(item) {
			NodeState::Watched => "[x]",
			NodeState::Unlocked => "[ ]",
			NodeState::Locked => "[-]",
		};
		match &item.release {
			Some(release) => println!("\t{} {} ({}) {}", marker, item.title, release, item.id()),
			None => println!("\t{} {} {}", marker, item.title, item.id()),
		}
	}
}

fn prompt_confirm(item: &watchmap::Item, currently_watched: bool) -> bool {
	let action = if currently_watched { "Unmark" } else { "Mark as watched" };
	let stdin = std::io::stdin();
	print!("{} \"{}\"? [(y)/n] ", action, item.title);
	let _ = std::io::stdout().flush();
	loop {
		let mut input = String::new();
		match stdin.read_line(&mut input) {
			Ok(0) | Err(_) => return false,
			Ok(_) => {},
		}
		let input = input.trim().to_lowercase();
		if input == "y" || input.is_empty() {
			return true
		} else if input == "n" {
			return false
		} else {
			println!("\nInput invalid.")
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("watchmap error: {0}")]
	WatchmapError(#[from] watchmap::Error),
	#[error("Missing argument: {0}")]
	MissingArgument(&'static str),
	#[error("No item with id \"{0}\" in the catalog")]
	UnknownItem(String),
	#[error("Unknown command \"{0}\"")]
	UnknownCommand(String),
}
