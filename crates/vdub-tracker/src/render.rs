/*
[INPUT]:  Tasks, task pages, details, result links, monitoring snapshots
[OUTPUT]: Terminal text with status colors
[POS]:    Output layer - everything printed to stdout
[UPDATE]: When CLI output layout changes
*/

use std::fmt::Write as _;

use console::{Color, style};
use vdub_adapter::presentation::{
    StatusTone,
    format_datetime,
    format_duration,
    language_name,
    status_label,
    status_tone,
};
use vdub_adapter::{
    DownloadLinks,
    HealthStatus,
    PageNavigator,
    SystemStats,
    Task,
    TaskDetail,
    TaskListResponse,
    TaskStatus,
};

const TITLE_WIDTH: usize = 28;
const PROGRESS_BAR_WIDTH: usize = 30;

pub fn tone_color(tone: StatusTone) -> Color {
    match tone {
        StatusTone::Neutral => Color::White,
        StatusTone::Blue => Color::Blue,
        StatusTone::Purple => Color::Magenta,
        StatusTone::Yellow => Color::Yellow,
        StatusTone::Pink => Color::Color256(205),
        StatusTone::Indigo => Color::Color256(62),
        StatusTone::Success => Color::Green,
        StatusTone::Danger => Color::Red,
    }
}

pub fn status_badge(status: &TaskStatus) -> String {
    style(status_label(status))
        .fg(tone_color(status_tone(status)))
        .bold()
        .to_string()
}

fn short_id(task: &Task) -> String {
    task.id.simple().to_string().chars().take(8).collect()
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

fn language_pair(task: &Task) -> String {
    format!("{} -> {}", task.source_language, task.target_language)
}

pub fn task_row(task: &Task) -> String {
    format!(
        "{:<8}  {:<width$}  {:<8}  {:>4}%  {}  {}",
        short_id(task),
        truncate(task.display_title(), TITLE_WIDTH),
        language_pair(task),
        task.progress,
        format_datetime(&task.created_at),
        status_badge(&task.status),
        width = TITLE_WIDTH,
    )
}

/// `1 [2] 3 4 5` with `<`/`>` markers when more pages exist on either side.
pub fn page_bar(navigator: &PageNavigator) -> String {
    let mut bar = String::new();
    if navigator.has_previous() {
        bar.push_str("< ");
    }
    let pages: Vec<String> = navigator
        .visible_pages()
        .into_iter()
        .map(|page| {
            if page == navigator.page() {
                format!("[{page}]")
            } else {
                page.to_string()
            }
        })
        .collect();
    bar.push_str(&pages.join(" "));
    if navigator.has_next() {
        bar.push_str(" >");
    }
    bar
}

/// Navigator sitting on `requested`, or None when that page is past the end.
pub fn navigator_at(list: &TaskListResponse, requested: u32) -> Option<PageNavigator> {
    let mut navigator = PageNavigator::new();
    navigator.set_total_pages(list.total_pages);
    (navigator.page() == requested || navigator.request(requested)).then_some(navigator)
}

pub fn page_out_of_range(requested: u32, total_pages: u32) -> String {
    format!("page {requested} out of range ({} pages)", total_pages.max(1))
}

pub fn task_table(list: &TaskListResponse, navigator: &PageNavigator) -> String {
    let mut out = String::new();
    if list.items.is_empty() {
        let empty = if list.total == 0 {
            "No tasks yet."
        } else {
            "No tasks on this page."
        };
        let _ = writeln!(out, "{}", style(empty).dim());
    } else {
        let _ = writeln!(
            out,
            "{}",
            style(format!(
                "{:<8}  {:<width$}  {:<8}  {:>5}  {:<19}  {}",
                "ID",
                "TITLE",
                "LANG",
                "PROG",
                "CREATED",
                "STATUS",
                width = TITLE_WIDTH,
            ))
            .bold()
        );
        for task in &list.items {
            let _ = writeln!(out, "{}", task_row(task));
        }
    }
    let _ = write!(out, "{} task(s), page {} of {}", list.total, navigator.page(), navigator.total_pages());
    if navigator.is_visible() {
        let _ = write!(out, "   {}", page_bar(navigator));
    }
    out.push('\n');
    out
}

pub fn task_detail(detail: &TaskDetail) -> String {
    let task = &detail.task;
    let mut out = String::new();
    let _ = writeln!(out, "{}", style(task.display_title()).bold().cyan());
    let _ = writeln!(out, "  id          {}", task.id);
    let _ = writeln!(out, "  status      {} ({}%)", status_badge(&task.status), task.progress);
    if let Some(step) = &task.current_step {
        let _ = writeln!(out, "  step        {step}");
    }
    let _ = writeln!(
        out,
        "  languages   {} -> {}",
        language_name(&task.source_language),
        language_name(&task.target_language)
    );
    let _ = writeln!(out, "  subtitles   {}", task.subtitle_mode);
    if let Some(duration) = detail.video_duration_ms {
        let _ = writeln!(out, "  duration    {}", format_duration(duration));
    }
    let _ = writeln!(out, "  created     {}", format_datetime(&task.created_at));
    let _ = writeln!(out, "  updated     {}", format_datetime(&task.updated_at));
    if let Some(completed_at) = &task.completed_at {
        let _ = writeln!(out, "  completed   {}", format_datetime(completed_at));
    }
    if let Some(message) = &task.error_message {
        let _ = writeln!(out, "  error       {}", style(message).red());
    }

    if !detail.segments.is_empty() {
        let _ = writeln!(out, "\n{}", style(format!("Segments ({})", detail.segments.len())).bold());
        for segment in &detail.segments {
            let _ = writeln!(
                out,
                "  #{:<3} {} - {}  {}",
                segment.segment_index,
                format_duration(segment.start_time_ms),
                format_duration(segment.end_time_ms),
                segment.original_text.as_deref().unwrap_or(""),
            );
            if let Some(translated) = &segment.translated_text {
                let _ = writeln!(out, "        {}", style(translated).dim());
            }
        }
    }
    out
}

pub fn download_links(links: &DownloadLinks) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "video      {}", links.download_url);
    if let Some(subtitle_url) = &links.subtitle_url {
        let _ = writeln!(out, "subtitles  {subtitle_url}");
    }
    let _ = writeln!(out, "{}", style(format!("links expire in {}s", links.expires_in)).dim());
    out
}

fn service_flag(up: bool) -> String {
    if up {
        style("up").green().to_string()
    } else {
        style("down").red().to_string()
    }
}

pub fn health(health: &HealthStatus) -> String {
    let overall = if health.is_healthy() {
        style(&health.status).green().bold()
    } else {
        style(&health.status).red().bold()
    };
    format!(
        "backend {overall} (version {})\n  database  {}\n  redis     {}\n  ffmpeg    {}\n",
        health.version,
        service_flag(health.services.database),
        service_flag(health.services.redis),
        service_flag(health.services.ffmpeg),
    )
}

pub fn stats(stats: &SystemStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", style(format!("Tasks: {}", stats.tasks.total)).bold());
    for status in TaskStatus::KNOWN.iter() {
        let _ = writeln!(out, "  {:<20} {}", status_badge(status), stats.tasks.count_for(status));
    }
    let _ = writeln!(out, "Workers: {} active", stats.workers.active);
    for worker in &stats.workers.registered {
        let _ = writeln!(out, "  {worker}");
    }
    out
}

pub fn progress_bar(percent: u8) -> String {
    let percent = percent.min(100) as usize;
    let filled = percent * PROGRESS_BAR_WIDTH / 100;
    format!(
        "[{}{}] {percent:>3}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled)
    )
}
