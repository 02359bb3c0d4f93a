use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use log::{error, warn, LevelFilter};

use fadraw::config::{self, AutomatonConfig, Kind};
use fadraw::dot::{self, Diagram, Format, DOT_COMMAND};
use fadraw::Result;

#[derive(Parser)]
#[command(name = "fadraw")]
#[command(about = "Draw finite automata and trace DFA runs with Graphviz")]
#[command(version)]
struct Cli {
    /// Log more (-v for info, -vv for debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Graphviz executable used for image formats
    #[arg(long, default_value = DOT_COMMAND, global = true)]
    dot: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the built-in example automata and trace two inputs
    Demo {
        /// Directory for the rendered diagrams
        #[arg(short, long, default_value = "images")]
        out_dir: PathBuf,

        #[arg(short, long, default_value = "png")]
        format: Format,
    },

    /// Draw an automaton described in a JSON file
    Render {
        input: PathBuf,

        /// Overrides the `kind` of the description (dfa, nfa, enfa)
        #[arg(short, long)]
        kind: Option<Kind>,

        /// Output file (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, default_value = "png")]
        format: Format,
    },

    /// Run an automaton on input strings and report the path taken
    Simulate {
        input: PathBuf,

        /// Strings to run, one symbol per character
        #[arg(required = true)]
        words: Vec<String>,

        #[arg(short, long)]
        kind: Option<Kind>,

        /// Draw the path of every word (DFA only); more than one word gets a numeric suffix
        #[arg(short, long)]
        diagram: Option<PathBuf>,

        #[arg(short, long, default_value = "png")]
        format: Format,
    },

    /// Print the epsilon closure of every state
    Closures { input: PathBuf },

    /// Turn an NFA into a DFA and print it as JSON
    Determinize {
        input: PathBuf,

        /// Also draw the resulting DFA
        #[arg(short, long)]
        diagram: Option<PathBuf>,

        #[arg(short, long, default_value = "png")]
        format: Format,
    },
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        })
        .parse_default_env()
        .init();

    process::exit(match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            error!("{}", e);
            1
        }
    });
}

fn kind_of(flag: Option<Kind>, config: &AutomatonConfig) -> Kind {
    flag.or(config.kind).unwrap_or(Kind::Dfa)
}

fn run(cli: Cli) -> Result<()> {
    let dot_command = cli.dot.as_str();
    match cli.command {
        Commands::Demo { out_dir, format } => demo(dot_command, &out_dir, format),
        Commands::Render {
            input,
            kind,
            output,
            format,
        } => {
            let config = AutomatonConfig::from_path(&input)?;
            let diagram = match kind_of(kind, &config) {
                Kind::Dfa => dot::dfa_diagram(&config.into_dfa()?),
                Kind::Nfa => dot::nfa_diagram(&config.into_nfa()?),
                Kind::Enfa => dot::epsilon_nfa_diagram(&config.into_nfa()?),
            };
            let output = output.unwrap_or_else(|| input.clone());
            let path = diagram.render_with(dot_command, output, format)?;
            println!("Wrote diagram to {}", path.display());
            Ok(())
        }
        Commands::Simulate {
            input,
            words,
            kind,
            diagram,
            format,
        } => {
            let config = AutomatonConfig::from_path(&input)?;
            match kind_of(kind, &config) {
                Kind::Dfa => {
                    let dfa = config.into_dfa()?;
                    for (i, word) in words.iter().enumerate() {
                        let simulation = dfa.simulate_str(word);
                        print_dfa_run(word, simulation.accepted, &simulation.path_names(&dfa));
                        if let Some(ref base) = diagram {
                            let path = if words.len() == 1 {
                                base.clone()
                            } else {
                                numbered(base, i + 1)
                            };
                            dot::dfa_path_diagram(&dfa, word, &simulation).render_with(dot_command, path, format)?;
                        }
                    }
                }
                Kind::Nfa | Kind::Enfa => {
                    if diagram.is_some() {
                        warn!("path diagrams are only drawn for DFAs");
                    }
                    let nfa = config.into_nfa()?;
                    for word in &words {
                        let nfa_run = nfa.run(word);
                        let steps: Vec<Vec<&str>> = nfa_run
                            .steps
                            .iter()
                            .map(|set| set.iter().map(|st| nfa.state_name(st)).collect())
                            .collect();
                        println!("String: {}, Accepted: {}, Steps: {:?}", word, nfa_run.accepted, steps);
                    }
                }
            }
            Ok(())
        }
        Commands::Closures { input } => {
            let nfa = AutomatonConfig::from_path(&input)?.into_nfa()?;
            println!("Epsilon closures: {}", nfa.epsilon_closures());
            Ok(())
        }
        Commands::Determinize {
            input,
            diagram,
            format,
        } => {
            let dfa = AutomatonConfig::from_path(&input)?.into_nfa()?.to_dfa()?;
            println!("{}", AutomatonConfig::from_dfa(&dfa).to_json()?);
            if let Some(path) = diagram {
                dot::dfa_diagram(&dfa).render_with(dot_command, path, format)?;
            }
            Ok(())
        }
    }
}

fn print_dfa_run(word: &str, accepted: bool, path: &[&str]) {
    println!("String: {}, Accepted: {}, Path: {:?}", word, accepted, path);
    if !accepted {
        warn!("{:?} was rejected in state {:?}", word, path.last());
    }
}

fn numbered(base: &Path, n: usize) -> PathBuf {
    let mut name = base.file_stem().map(|s| s.to_os_string()).unwrap_or_default();
    name.push(n.to_string());
    base.with_file_name(name)
}

/// Renders the bundled example automata and traces two inputs through the DFA.
fn demo(dot_command: &str, out_dir: &Path, format: Format) -> Result<()> {
    let render = |diagram: Diagram, name: &str| -> Result<()> {
        diagram.render_with(dot_command, out_dir.join(name), format)?;
        Ok(())
    };

    let dfa = config::demo_dfa().into_dfa()?;
    render(dot::dfa_diagram(&dfa), "dfa_visualization")?;

    let nfa = config::demo_nfa().into_nfa()?;
    render(dot::nfa_diagram(&nfa), "nfa_visualization")?;

    let e_nfa = config::demo_epsilon_nfa().into_nfa()?;
    println!("Epsilon closures: {}", e_nfa.epsilon_closures());
    render(dot::epsilon_nfa_diagram(&e_nfa), "epsilon_e_nfa_visualization")?;

    for (i, word) in ["1000101", "0010111"].iter().enumerate() {
        let simulation = dfa.simulate_str(word);
        print_dfa_run(word, simulation.accepted, &simulation.path_names(&dfa));
        render(
            dot::dfa_path_diagram(&dfa, word, &simulation),
            &format!("dfa_path_visualization{}", i + 1),
        )?;
    }
    Ok(())
}
