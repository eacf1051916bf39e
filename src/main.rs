use raylib::prelude::*;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use niche_shorts::config::Config;
use niche_shorts::init;
use niche_shorts::pipeline::{run_for_topic, GenerateResponse};
use niche_shorts::platform;
use niche_shorts::set_log_hook;
use niche_shorts::topic::Topic;

const CONFIG_PATH: &str = "config.json";
const LOG_MAX_LINES: usize = 300;
const LOG_LINE_MAX: usize = 600;

const COLOR_BG: Color = Color::new(25, 25, 25, 255);
const COLOR_BTN: Color = Color::new(40, 90, 170, 255);
const COLOR_BTN_HOVER: Color = Color::new(70, 120, 200, 255);
const COLOR_BTN_DISABLED: Color = Color::new(60, 60, 60, 255);
const COLOR_LOG_BG: Color = Color::new(18, 18, 18, 255);
const COLOR_LOG_TEXT: Color = Color::new(210, 210, 210, 255);

struct AppState {
    running: Arc<AtomicBool>,
    last_result: Arc<Mutex<String>>,
    log_buffer: Arc<Mutex<Vec<String>>>,
}

fn push_log_line(buffer: &Arc<Mutex<Vec<String>>>, line: &str) {
    let mut guard = buffer.lock().unwrap_or_else(|e| e.into_inner());
    if guard.len() >= LOG_MAX_LINES {
        let excess = guard.len() + 1 - LOG_MAX_LINES;
        guard.drain(0..excess);
    }
    let mut text = line.to_string();
    if text.len() > LOG_LINE_MAX {
        let mut cut = LOG_LINE_MAX;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    guard.push(text);
}

fn set_result(slot: &Arc<Mutex<String>>, text: String) {
    *slot.lock().unwrap_or_else(|e| e.into_inner()) = text;
}

fn summarize(response: &GenerateResponse) -> String {
    match response {
        GenerateResponse::Videos { videos } => videos
            .first()
            .map(|v| format!("Done: {} ({})", v.url, v.duration))
            .unwrap_or_else(|| "Done".to_string()),
        GenerateResponse::Error { error, stage, .. } => {
            format!("Failed while {}: {}", stage, error)
        }
    }
}

fn draw_button(
    d: &mut RaylibDrawHandle,
    rect: Rectangle,
    label: &str,
    enabled: bool,
    font_size: f32,
) -> bool {
    let mouse = d.get_mouse_position();
    let hot = rect.check_collision_point_rec(mouse);

    let bg = if !enabled {
        COLOR_BTN_DISABLED
    } else if hot {
        COLOR_BTN_HOVER
    } else {
        COLOR_BTN
    };

    d.draw_rectangle_rounded(rect, 0.25, 10, bg);
    d.draw_rectangle_rounded_lines(rect, 0.25, 10, Color::new(20, 20, 20, 255));

    let ts = d.measure_text(label, font_size as i32);
    let pos_x = rect.x + (rect.width - ts as f32) * 0.5;
    let pos_y = rect.y + (rect.height - font_size) * 0.5;

    d.draw_text(label, pos_x as i32, pos_y as i32, font_size as i32, Color::RAYWHITE);

    enabled && hot && d.is_mouse_button_released(MouseButton::MOUSE_BUTTON_LEFT)
}

fn draw_log_panel(d: &mut RaylibDrawHandle, rect: Rectangle, lines: &[String]) {
    d.draw_rectangle_rec(rect, COLOR_LOG_BG);
    d.draw_rectangle_lines_ex(rect, 2.0, Color::new(40, 40, 40, 255));

    let font_size = 14;
    let pad = 8.0;
    let line_h = 16.0;
    let max_lines = ((rect.height - 2.0 * pad) / line_h).floor().max(1.0) as usize;

    let start = lines.len().saturating_sub(max_lines);

    let mut y = rect.y + pad;
    for line in lines.iter().skip(start) {
        let pos_x = rect.x + pad;
        d.draw_text(line, pos_x as i32, y as i32, font_size, COLOR_LOG_TEXT);
        y += line_h;
    }
}

fn start_generation_thread(state: &AppState, topic: Topic) {
    if state.running.swap(true, Ordering::SeqCst) {
        return;
    }
    set_result(&state.last_result, format!("Generating: {}", topic.label()));

    let running = Arc::clone(&state.running);
    let last_result = Arc::clone(&state.last_result);
    let log_buffer = Arc::clone(&state.log_buffer);

    std::thread::spawn(move || {
        let hook_buffer = Arc::clone(&log_buffer);
        let hook = Arc::new(Mutex::new(move |line: &str| {
            push_log_line(&hook_buffer, line);
        }));

        set_log_hook(Some(hook));
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(err) => {
                push_log_line(&log_buffer, &format!("[ERROR] {}", err));
                set_result(&last_result, "Failed to initialize async runtime".to_string());
                running.store(false, Ordering::SeqCst);
                set_log_hook(None);
                return;
            }
        };

        match rt.block_on(run_for_topic(CONFIG_PATH, topic.label())) {
            Ok(response) => set_result(&last_result, summarize(&response)),
            Err(err) => {
                push_log_line(&log_buffer, &format!("[ERROR] {:#}", err));
                set_result(&last_result, format!("Failed: {}", err));
            }
        }

        set_log_hook(None);
        running.store(false, Ordering::SeqCst);
    });
}

fn snapshot_logs(buffer: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    buffer.lock().unwrap_or_else(|e| e.into_inner()).clone()
}

fn clear_logs(buffer: &Arc<Mutex<Vec<String>>>) {
    buffer.lock().unwrap_or_else(|e| e.into_inner()).clear();
}

fn main() {
    niche_shorts::init_tracing();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create async runtime");
    let config = rt.block_on(async {
        let config = match Config::load_or_default(CONFIG_PATH).await {
            Ok(config) => config,
            Err(e) => {
                eprintln!("[ERROR] {:#}", e);
                Config::default()
            }
        };
        if let Err(e) = init::ensure_directories(&config).await {
            eprintln!("[ERROR] Failed to create directories: {}", e);
        }
        if !init::check_ffmpeg(&config.ffmpeg_path).await {
            eprintln!("[WARNING] FFmpeg not found in PATH. Please install FFmpeg.");
        }
        config
    });
    drop(rt);

    let (mut rl, thread) = raylib::init()
        .size(920, 560)
        .resizable()
        .title("Niche Shorts")
        .build();
    rl.set_target_fps(60);

    let state = AppState {
        running: Arc::new(AtomicBool::new(false)),
        last_result: Arc::new(Mutex::new(String::new())),
        log_buffer: Arc::new(Mutex::new(Vec::with_capacity(LOG_MAX_LINES))),
    };

    while !rl.window_should_close() {
        let mut d = rl.begin_drawing(&thread);
        d.clear_background(COLOR_BG);

        d.draw_text("Niche", 30, 20, 24, Color::RAYWHITE);

        let can_start = !state.running.load(Ordering::SeqCst);
        let mut y = 60.0;
        for topic in Topic::ALL {
            if draw_button(
                &mut d,
                Rectangle::new(30.0, y, 260.0, 44.0),
                topic.label(),
                can_start,
                18.0,
            ) {
                clear_logs(&state.log_buffer);
                start_generation_thread(&state, topic);
            }
            y += 55.0;
        }

        d.draw_text("Folders", 30, (y + 10.0) as i32, 24, Color::RAYWHITE);
        y += 50.0;

        if draw_button(
            &mut d,
            Rectangle::new(30.0, y, 260.0, 44.0),
            "Open Output Folder",
            true,
            18.0,
        ) {
            if let Err(e) = platform::open_folder(&config.output_dir) {
                push_log_line(&state.log_buffer, &format!("[WARN] Could not open folder: {}", e));
            }
        }
        y += 55.0;

        if draw_button(
            &mut d,
            Rectangle::new(30.0, y, 260.0, 44.0),
            "Open Music Folder",
            true,
            18.0,
        ) {
            if let Err(e) = platform::open_folder(&config.music_dir) {
                push_log_line(&state.log_buffer, &format!("[WARN] Could not open folder: {}", e));
            }
        }
        y += 65.0;

        let status = if state.running.load(Ordering::SeqCst) {
            "Status: RUNNING"
        } else {
            "Status: IDLE"
        };
        d.draw_text(status, 30, y as i32, 18, Color::new(220, 220, 220, 255));
        let result = state
            .last_result
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        d.draw_text(&result, 30, (y + 26.0) as i32, 14, COLOR_LOG_TEXT);

        d.draw_text("Log", 320, 20, 24, Color::RAYWHITE);
        let lines = snapshot_logs(&state.log_buffer);
        draw_log_panel(
            &mut d,
            Rectangle::new(320.0, 60.0, 570.0, 470.0),
            &lines,
        );
    }
}
