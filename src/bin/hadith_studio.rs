use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use hadith_studio::cards::HadithCard;
use hadith_studio::config::load_config;
use hadith_studio::generate::GenerationOutcome;
use hadith_studio::mode::GenerationMode;
use hadith_studio::models::VideoSource;
use hadith_studio::notify::ToastKind;
use hadith_studio::paths::AppPaths;
use hadith_studio::studio::Studio;
use hadith_studio::view::StudioView;

/// Prints every view transition as a line of text.
struct TerminalView;

impl StudioView for TerminalView {
    fn notify(&self, kind: ToastKind, message: &str) {
        println!("{} {message}", kind.icon());
    }

    fn show_error(&self, message: &str) {
        eprintln!("error: {message}");
    }

    fn show_success(&self, message: &str) {
        println!("{message}");
    }

    fn show_loading(&self, text: &str) {
        println!("... {text}");
    }

    fn hide_loading(&self) {}

    fn show_results(&self, cards: &[HadithCard]) {
        for card in cards {
            print_card(card);
        }
    }

    fn hide_results(&self) {}

    fn show_progress(&self) {}

    fn update_progress(&self, percent: u8, message: &str) {
        println!("[{percent:>3}%] {message}");
    }

    fn hide_progress(&self) {}

    fn set_cancel_visible(&self, _visible: bool) {}

    fn show_preview(&self, _video: &VideoSource, preview_url: &str) {
        println!("Preview: {preview_url}");
    }

    fn hide_preview(&self) {}
}

fn print_card(card: &HadithCard) {
    let star = if card.is_favorite { "★" } else { " " };
    println!("{star} {}. {}", card.index + 1, card.text);
    if let Some(narrator) = &card.narrator {
        println!("     الراوي: {narrator}");
    }
    if let Some(source) = &card.source {
        println!("     المصدر: {source}");
    }
    if let Some(grade) = &card.grade {
        println!("     {} {}", grade.class.icon(), grade.label);
    }
    println!("     {}", card.explanation);
}

fn main() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args.iter().any(|a| a == "-h" || a == "--help") {
        print_help();
        return Ok(());
    }

    let mut base_dir: Option<PathBuf> = None;
    let mut server: Option<String> = None;
    let mut generate: Option<usize> = None;
    let mut mode: Option<GenerationMode> = None;
    let mut download: Option<PathBuf> = None;
    let mut prompt: Option<PromptKind> = None;
    let mut style: Option<String> = None;
    let mut provider: Option<String> = None;
    let mut share = false;
    let mut copy: Option<usize> = None;
    let mut positional: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--base-dir" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--base-dir requires a value".to_string())?;
                base_dir = Some(PathBuf::from(v));
            }
            "--server" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--server requires a value".to_string())?;
                server = Some(v.to_string());
            }
            "--generate" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--generate requires a value".to_string())?;
                generate = Some(parse_index(v)?);
            }
            "--mode" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--mode requires a value".to_string())?;
                mode = Some(
                    GenerationMode::parse(v)
                        .ok_or_else(|| format!("unknown mode: {v} (sync|async|kie)"))?,
                );
            }
            "--download" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--download requires a value".to_string())?;
                download = Some(PathBuf::from(v));
            }
            "--prompt" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--prompt requires a value".to_string())?;
                prompt = Some(match v.as_str() {
                    "local" => PromptKind::Local,
                    "ai" => PromptKind::Ai,
                    other => return Err(format!("unknown prompt kind: {other} (local|ai)")),
                });
            }
            "--style" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--style requires a value".to_string())?;
                style = Some(v.to_string());
            }
            "--provider" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--provider requires a value".to_string())?;
                provider = Some(v.to_string());
            }
            "--copy" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--copy requires a value".to_string())?;
                copy = Some(parse_index(v)?);
            }
            "--share" => share = true,
            other if other.starts_with("--") => {
                return Err(format!("unknown arg: {other} (try --help)"))
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let base_dir = base_dir
        .or_else(default_base_dir)
        .or_else(|| std::env::current_dir().ok())
        .ok_or_else(|| "could not determine base dir; pass --base-dir".to_string())?;
    let paths = AppPaths::new(AppPaths::normalize_base_dir(&base_dir));

    let mut config = load_config(&paths).map_err(|e| e.to_string())?;
    if let Some(url) = server.or_else(env_server) {
        config.server_url = url;
    }

    let studio = Studio::open(paths, config, Arc::new(TerminalView)).map_err(|e| e.to_string())?;

    let (command, rest) = positional
        .split_first()
        .ok_or_else(|| "missing command (try --help)".to_string())?;
    let after = AfterGeneration {
        prompt,
        style,
        provider,
        share,
        download,
    };
    match command.as_str() {
        "search" => {
            let keyword = rest.join(" ");
            let found = studio
                .search()
                .search(&keyword)
                .map_err(|e| e.user_message())?;
            if let Some(n) = copy {
                let text = studio
                    .search()
                    .copy_text(n - 1)
                    .ok_or_else(|| format!("no result #{n}; the search returned {}", found.len()))?;
                println!("{text}");
            }
            if let Some(n) = generate {
                if n > found.len() {
                    return Err(format!("no result #{n}; the search returned {}", found.len()));
                }
                if let Some(mode) = mode {
                    studio.select_mode(mode);
                }
                if let Some(hadith) = studio.session().result_at(n - 1) {
                    studio.session().select_hadith(hadith);
                }
                request_prompt(&studio, &after)?;
                let outcome = studio
                    .generator()
                    .generate_result(n - 1)
                    .map_err(|e| e.user_message())?;
                finish_generation(&studio, outcome, &after)?;
            }
        }
        "favorites" => {
            let favorites = studio.store().favorites();
            if favorites.is_empty() {
                println!("لا توجد أحاديث مفضلة");
            }
            for (idx, entry) in favorites.iter().enumerate() {
                println!("{}. {}", idx + 1, entry.hadith.text);
            }
            if let Some(n) = generate {
                if let Some(mode) = mode {
                    studio.select_mode(mode);
                }
                if let Some(entry) = studio.store().favorite_at(n - 1) {
                    studio.session().select_hadith(entry.hadith);
                }
                request_prompt(&studio, &after)?;
                let outcome = studio
                    .generator()
                    .generate_from_favorite(n - 1)
                    .map_err(|e| e.user_message())?;
                finish_generation(&studio, outcome, &after)?;
            }
        }
        "favorite" => {
            let (index, words) = rest
                .split_last()
                .ok_or_else(|| "usage: favorite <keyword> <n>".to_string())?;
            let n = parse_index(index)?;
            studio
                .search()
                .search(&words.join(" "))
                .map_err(|e| e.user_message())?;
            studio
                .search()
                .toggle_favorite(n - 1)
                .map_err(|e| e.user_message())?;
        }
        "history" => match rest.first() {
            Some(n) => {
                let n = parse_index(n)?;
                studio
                    .search()
                    .search_from_history(n - 1)
                    .map_err(|e| e.user_message())?;
            }
            None => {
                for (idx, entry) in studio.search().history().iter().enumerate() {
                    println!("{}. {}\t{}", idx + 1, entry.timestamp_ms, entry.keyword);
                }
            }
        },
        "clear-history" => {
            studio
                .search()
                .clear_history()
                .map_err(|e| e.user_message())?;
        }
        "generations" => {
            for record in studio.store().generation_history() {
                let target = match &record.video {
                    VideoSource::Local { file_name } => file_name.clone(),
                    VideoSource::External { url } => url.clone(),
                };
                println!("{}\t{}\t{}", record.created_at_ms, target, record.hadith.text);
            }
        }
        "export" => {
            let target = rest.first().map(PathBuf::from);
            let path = studio.export(target).map_err(|e| e.user_message())?;
            println!("{}", path.to_string_lossy());
        }
        "status" => {
            let counters = studio.refresh_counters();
            println!("Server: {}", studio.config().server_url);
            println!("Base dir: {}", studio.paths().base_dir.to_string_lossy());
            match counters.total_videos {
                Some(n) => println!("Videos: {n}"),
                None => println!("Videos: unavailable"),
            }
            match counters.active_providers {
                Some(n) => println!("AI providers online: {n}"),
                None => println!("AI providers online: unavailable"),
            }
            println!(
                "Night mode: {}",
                if studio.store().night_mode() { "on" } else { "off" }
            );
        }
        "night-mode" => match rest.first().map(String::as_str) {
            Some("on") => studio.set_night_mode(true).map_err(|e| e.to_string())?,
            Some("off") => studio.set_night_mode(false).map_err(|e| e.to_string())?,
            Some("toggle") | None => {
                studio.toggle_night_mode().map_err(|e| e.to_string())?;
            }
            Some(other) => return Err(format!("unknown night-mode value: {other} (on|off|toggle)")),
        },
        other => return Err(format!("unknown command: {other} (try --help)")),
    }

    Ok(())
}

enum PromptKind {
    Local,
    Ai,
}

/// What to do around a `--generate` run.
struct AfterGeneration {
    prompt: Option<PromptKind>,
    style: Option<String>,
    provider: Option<String>,
    share: bool,
    download: Option<PathBuf>,
}

fn request_prompt(studio: &Studio, after: &AfterGeneration) -> Result<(), String> {
    let style = after.style.as_deref();
    let prompt = match after.prompt {
        None => return Ok(()),
        Some(PromptKind::Local) => studio.generator().generate_prompt(style),
        Some(PromptKind::Ai) => studio
            .generator()
            .generate_ai_prompt(style, after.provider.as_deref())
            .map(|g| g.prompt),
    }
    .map_err(|e| e.user_message())?;
    println!("Prompt: {prompt}");
    Ok(())
}

/// Blocks until an async job settles, then shares and downloads if requested.
fn finish_generation(
    studio: &Studio,
    outcome: GenerationOutcome,
    after: &AfterGeneration,
) -> Result<(), String> {
    if let GenerationOutcome::Tracking { job_id } = outcome {
        println!("Tracking job {job_id}");
        while !studio.tracker().wait_idle(Duration::from_secs(30)) {
            println!("Job {job_id} still running");
        }
    }

    if let Some(target) = studio.generator().download_target() {
        println!("Download: {target}");
    }
    if after.share {
        let link = studio.generator().share_link().map_err(|e| e.user_message())?;
        println!("{}\n{}\n{}", link.title, link.text, link.url);
    }
    if let Some(dst) = after.download.clone() {
        let path = studio
            .generator()
            .download(Some(dst))
            .map_err(|e| e.user_message())?;
        println!("Saved: {}", path.to_string_lossy());
    }
    Ok(())
}

fn parse_index(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!("expected a 1-based number, got: {raw}")),
    }
}

fn default_base_dir() -> Option<PathBuf> {
    let v = std::env::var("HADITH_STUDIO_BASE_DIR").ok()?;
    let t = v.trim();
    if t.is_empty() {
        return None;
    }
    Some(PathBuf::from(t))
}

fn env_server() -> Option<String> {
    let v = std::env::var("HADITH_STUDIO_SERVER").ok()?;
    let t = v.trim();
    if t.is_empty() {
        return None;
    }
    Some(t.to_string())
}

fn print_help() {
    println!(
        r#"hadith_studio

Searches hadith text and turns it into short videos through the studio backend.

Usage:
  hadith_studio [--base-dir <path>] [--server <url>] <command> [args]

Commands:
  search <keyword> [--copy <n>] [--generate <n> <generation flags>]
  favorites [--generate <n> <generation flags>]
  favorite <keyword> <n>      Toggle result <n> of a search as a favorite
  history [n]                 Recent search keywords, or rerun entry <n>
  clear-history
  generations                 Videos generated so far
  export [path]               Write favorites and history as JSON
  status                      Backend counters
  night-mode on|off|toggle

Generation flags:
  --mode sync|async|kie
  --prompt local|ai           Ask the server for a background prompt first
  --style <name>              Prompt style (default: video_type, then islamic)
  --provider <name>           AI prompt provider (default: gemini)
  --share                     Print a share link for the finished video
  --download <path>

Environment:
  HADITH_STUDIO_BASE_DIR      Used when --base-dir is not given (default: current dir)
  HADITH_STUDIO_SERVER        Used when --server is not given (default: config/studio.json)
"#
    );
}
