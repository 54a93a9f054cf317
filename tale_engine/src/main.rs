#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** Tale **
//! Plays a dialogue tree in the terminal.
//!
//! Usage: `tale [tree.ron]` (defaults to `data/intro.ron`). At a choice prompt,
//! enter the choice number, `save <slot>`, `load <slot>` or `quit`.

use std::env;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use log::{info, warn};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use textwrap::{fill, termwidth};

use tale_engine::command::ENDING_KEY;
use tale_engine::data_paths::data_path;
use tale_engine::snapshot::{SessionSnapshot, load_snapshot, save_snapshot, slot_path};
use tale_engine::{
    DialogueEngine, DialogueEvent, DialogueTree, PlayerInventory, VariableStore, load_config, load_tree,
};

type Engine = DialogueEngine<PlayerInventory>;

/// How often the auto-end countdown is ticked while waiting on an end node.
const TICK: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    env_logger::init();
    info!("Start: loading tale...");
    let config = load_config(&data_path("engine.toml"));
    let tree_path = env::args_os().nth(1).map_or_else(|| data_path("intro.ron"), PathBuf::from);
    let tree = load_tree(&tree_path).context("while loading dialogue tree")?;

    let mut engine = DialogueEngine::new(VariableStore::new(config.store), PlayerInventory::new(), config.dialogue);
    engine.subscribe(print_event);

    println!("{:^72}\n", tree.title().to_uppercase().bright_yellow().underline());
    engine.start(Arc::clone(&tree))?;
    let mut input = Input::new();
    play(&mut engine, &tree, &mut input)?;

    let ending = engine.store().get_string(ENDING_KEY);
    if !ending.is_empty() {
        println!("\n{} {}", "Ending reached:".subheading_style(), ending.ending_style());
    }
    if !engine.inventory().items().is_empty() {
        println!("{} {}", "You carry:".subheading_style(), engine.inventory().items().join(", "));
    }
    info!("tale finished");
    Ok(())
}

/// Drive the dialogue until it ends or the player quits.
fn play(engine: &mut Engine, tree: &Arc<DialogueTree>, input: &mut Input) -> Result<()> {
    while engine.is_active() {
        let choices: Vec<String> = engine.visible_choices().iter().map(|c| c.text.clone()).collect();

        if choices.is_empty() {
            if engine.pending_auto_end() {
                while engine.pending_auto_end() {
                    thread::sleep(TICK);
                    engine.update(TICK);
                }
                continue;
            }
            match input.read_line(&format!("{} ", "[Enter]".prompt_style()))? {
                InputEvent::Line(line) if handle_meta(engine, tree, line.trim()) => {},
                InputEvent::Line(_) => {
                    if let Err(e) = engine.advance_to_next_node() {
                        println!("{}", e.to_string().as_str().error_style());
                    }
                },
                InputEvent::Eof | InputEvent::Interrupted => {
                    engine.force_end();
                },
            }
            continue;
        }

        if choices.len() == 1 && engine.current_tree().is_some_and(|t| t.auto_advance_single_choice()) {
            println!("  {} {}", ">".prompt_style(), choices[0].as_str().choice_style());
            engine.select_choice(0)?;
            continue;
        }

        for (i, text) in choices.iter().enumerate() {
            println!("  {} {}", format!("{}.", i + 1).prompt_style(), text.as_str().choice_style());
        }
        let line = match input.read_line(&format!("{} ", ">>".prompt_style()))? {
            InputEvent::Line(line) => line,
            InputEvent::Eof | InputEvent::Interrupted => {
                engine.force_end();
                continue;
            },
        };
        let line = line.trim();
        if handle_meta(engine, tree, line) {
            continue;
        }
        match line.parse::<usize>() {
            Ok(n) if n >= 1 => {
                if let Err(e) = engine.select_choice(n - 1) {
                    println!("{}", e.to_string().as_str().error_style());
                }
            },
            _ => println!("{}", "Enter a choice number, 'save <slot>', 'load <slot>' or 'quit'.".error_style()),
        }
    }
    Ok(())
}

/// Handle `quit`, `save` and `load`. Returns false if `line` is none of them.
fn handle_meta(engine: &mut Engine, tree: &Arc<DialogueTree>, line: &str) -> bool {
    let (verb, arg) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    match verb.to_lowercase().as_str() {
        "quit" | "q" => {
            engine.force_end();
        },
        "save" => {
            let path = slot_path(if arg.trim().is_empty() { "quick" } else { arg });
            match save_snapshot(&path, &SessionSnapshot::capture(engine)) {
                Ok(()) => println!("Saved to {}", path.display().to_string().underline()),
                Err(e) => {
                    warn!("save failed: {e:#}");
                    println!("{}", format!("Could not save: {e:#}").as_str().error_style());
                },
            }
        },
        "load" => {
            let path = slot_path(if arg.trim().is_empty() { "quick" } else { arg });
            let loaded = load_snapshot(&path).and_then(|snap| snap.apply(engine, Some(Arc::clone(tree))));
            match loaded {
                Ok(()) => {
                    println!("Loaded {}", path.display().to_string().underline());
                    if !engine.is_active()
                        && let Err(e) = engine.start(Arc::clone(tree))
                    {
                        println!("{}", e.to_string().as_str().error_style());
                    }
                },
                Err(e) => {
                    warn!("load failed: {e:#}");
                    println!("{}", format!("Could not load: {e:#}").as_str().error_style());
                },
            }
        },
        _ => return false,
    }
    true
}

fn print_event(event: &DialogueEvent<'_>) {
    match event {
        DialogueEvent::NodeDisplayed { tree, node } => {
            println!();
            if let Some(speaker) = &node.speaker {
                println!("{}", speaker.as_str().speaker_style());
            }
            typewrite(&node.text, tree.typing_speed());
        },
        DialogueEvent::ImpactApplied { key, delta } => {
            println!("{}", format!("({key} {delta:+})").as_str().impact_style());
        },
        DialogueEvent::ItemGiven { item_id } => {
            println!("You received {}.", item_id.item_style());
        },
        DialogueEvent::DialogueEnded => println!("\n{}", "~ fin ~".ending_style()),
        DialogueEvent::ChoicesUpdated { .. } | DialogueEvent::ChoiceSelected { .. } => {},
    }
}

/// Print wrapped text a character at a time, or all at once when not on a terminal.
fn typewrite(text: &str, chars_per_sec: f32) {
    let wrapped = fill(text, termwidth().min(88));
    let Ok(delay) = Duration::try_from_secs_f32(1.0 / chars_per_sec) else {
        println!("{wrapped}");
        return;
    };
    let mut stdout = io::stdout();
    if !stdout.is_terminal() || delay.is_zero() {
        println!("{wrapped}");
        return;
    }
    for c in wrapped.chars() {
        print!("{c}");
        stdout.flush().ok();
        thread::sleep(delay);
    }
    println!();
}

trait TaleStyle {
    fn speaker_style(&self) -> ColoredString;
    fn choice_style(&self) -> ColoredString;
    fn prompt_style(&self) -> ColoredString;
    fn impact_style(&self) -> ColoredString;
    fn item_style(&self) -> ColoredString;
    fn ending_style(&self) -> ColoredString;
    fn subheading_style(&self) -> ColoredString;
    fn error_style(&self) -> ColoredString;
}

impl TaleStyle for &str {
    fn speaker_style(&self) -> ColoredString {
        self.truecolor(13, 130, 60).bold()
    }
    fn choice_style(&self) -> ColoredString {
        self.truecolor(75, 180, 255)
    }
    fn prompt_style(&self) -> ColoredString {
        self.truecolor(75, 80, 75)
    }
    fn impact_style(&self) -> ColoredString {
        self.italic().truecolor(220, 40, 220)
    }
    fn item_style(&self) -> ColoredString {
        self.truecolor(220, 180, 40)
    }
    fn ending_style(&self) -> ColoredString {
        self.truecolor(223, 77, 10).bold()
    }
    fn subheading_style(&self) -> ColoredString {
        self.underline()
    }
    fn error_style(&self) -> ColoredString {
        self.truecolor(230, 30, 30)
    }
}

impl TaleStyle for String {
    fn speaker_style(&self) -> ColoredString {
        self.as_str().speaker_style()
    }
    fn choice_style(&self) -> ColoredString {
        self.as_str().choice_style()
    }
    fn prompt_style(&self) -> ColoredString {
        self.as_str().prompt_style()
    }
    fn impact_style(&self) -> ColoredString {
        self.as_str().impact_style()
    }
    fn item_style(&self) -> ColoredString {
        self.as_str().item_style()
    }
    fn ending_style(&self) -> ColoredString {
        self.as_str().ending_style()
    }
    fn subheading_style(&self) -> ColoredString {
        self.as_str().subheading_style()
    }
    fn error_style(&self) -> ColoredString {
        self.as_str().error_style()
    }
}

enum InputEvent {
    Line(String),
    Eof,
    Interrupted,
}

/// Line input: `rustyline` on a terminal, plain stdin otherwise.
enum Input {
    Rustyline(DefaultEditor),
    Plain,
}

impl Input {
    fn new() -> Self {
        if !io::stdin().is_terminal() {
            info!("stdin is not a TTY; using basic input mode");
            return Self::Plain;
        }
        match DefaultEditor::new() {
            Ok(editor) => Self::Rustyline(editor),
            Err(err) => {
                warn!("failed to initialize rustyline ({err}), falling back to basic stdin");
                Self::Plain
            },
        }
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        match self {
            Self::Rustyline(editor) => match editor.readline(prompt) {
                Ok(line) => {
                    if !line.trim().is_empty()
                        && let Err(err) = editor.add_history_entry(line.as_str())
                    {
                        warn!("failed to append to history: {err}");
                    }
                    Ok(InputEvent::Line(line))
                },
                Err(ReadlineError::Interrupted) => Ok(InputEvent::Interrupted),
                Err(ReadlineError::Eof) => Ok(InputEvent::Eof),
                Err(ReadlineError::Io(err)) => Err(err),
                Err(other) => Err(io::Error::other(other)),
            },
            Self::Plain => {
                print!("{prompt}");
                io::stdout().flush()?;
                let mut buffer = String::new();
                if io::stdin().read_line(&mut buffer)? == 0 {
                    return Ok(InputEvent::Eof);
                }
                Ok(InputEvent::Line(buffer.trim_end_matches(['\n', '\r']).to_string()))
            },
        }
    }
}
