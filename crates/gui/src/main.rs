use controller::RodDirection;
use eframe::egui;
use egui_plot::{Line, Plot, PlotPoints};
use safety::SafetyLimits;
use serde::Deserialize;
use session::Session;
use sim::{NoiseSource, PhysicsConstants, PrngNoise, RodMode, ROD_STEPS_FULL_OUT};
use std::fs;

/// RESET only fires on a triple click inside this window, so a stray click
/// cannot clear a trip.
const RESET_WINDOW_S: f64 = 1.5;

/// One JSONL row as the CLI writes it. Field names must stay in sync with
/// the CLI's trace format.
#[derive(Debug, Deserialize)]
struct TraceRow {
    t_s: f64,
    power_pct: f64,
    rod_steps: u16,
    core_temp_c: f64,
    rcs_mpa: f64,
    przr_mpa: f64,
    przr_level_pct: f64,
    flux_pct: f64,
    sg_mpa: f64,
    sg_temp_c: f64,
    sg_flow_kg_s: f64,
    steam_flow_kg_s: f64,
    turbine_mwe: f64,
    thermal_mwt: f64,
    cond_vac_kpa: f64,
    online: bool,
    scram: bool,
    mode: String,
    reason: Option<String>,
}

#[derive(Default)]
struct Series {
    power: Vec<[f64; 2]>,
    flux: Vec<[f64; 2]>,
    core_temp: Vec<[f64; 2]>,
    sg_temp: Vec<[f64; 2]>,
    rcs: Vec<[f64; 2]>,
    przr: Vec<[f64; 2]>,
    sg: Vec<[f64; 2]>,
    steam: Vec<[f64; 2]>,
    turbine: Vec<[f64; 2]>,
}

struct App {
    // Settings for a fresh live run
    seed: u64,
    setpoint: f64,

    // Live simulation
    session: Session,
    running: bool,
    reset_clicks: Vec<f64>,

    // Replay of a CLI trace
    replay_loaded: bool,
    replay_path: String,
    replay_all: Vec<TraceRow>,
    replay_pos: usize,
    replay_playing: bool,
    replay_speed: usize, // rows revealed per frame
    last_error: Option<String>,
}

fn new_session(seed: u64, setpoint: f64) -> Session {
    let mut s = Session::new(
        PhysicsConstants::default(),
        SafetyLimits::default(),
        Box::new(PrngNoise::seeded(seed)),
    )
    .expect("default constants are valid");
    s.set_setpoint(setpoint);
    s
}

impl Default for App {
    fn default() -> Self {
        // Each launch draws a fresh seed; the drag value shows it, so any
        // run can still be repeated by restarting with the same number.
        let seed = (PrngNoise::from_entropy().uniform() * u64::MAX as f64) as u64;
        let setpoint = 100.0;
        Self {
            seed,
            setpoint,
            session: new_session(seed, setpoint),
            running: false,
            reset_clicks: Vec::new(),
            replay_loaded: false,
            replay_path: "out/withdrawal.jsonl".to_string(),
            replay_all: Vec::new(),
            replay_pos: 0,
            replay_playing: false,
            replay_speed: 10,
            last_error: None,
        }
    }
}

impl App {
    fn restart_live(&mut self) {
        self.running = false;
        self.reset_clicks.clear();
        self.session = new_session(self.seed, self.setpoint);
    }

    fn clear_replay(&mut self) {
        self.replay_loaded = false;
        self.replay_all.clear();
        self.replay_pos = 0;
        self.replay_playing = false;
        self.last_error = None;
    }

    fn load_jsonl(&mut self, path: &str) {
        self.last_error = None;

        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                self.last_error = Some(format!("Failed to read {path}: {e}"));
                return;
            }
        };

        let mut loaded: Vec<TraceRow> = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(row) => loaded.push(row),
                Err(e) => {
                    self.last_error = Some(format!("JSON parse error at line {}: {}", i + 1, e));
                    return;
                }
            }
        }

        if loaded.is_empty() {
            self.last_error = Some(format!("No rows found in {path}"));
            return;
        }

        self.running = false;
        self.clear_replay();
        self.replay_loaded = true;
        self.replay_all = loaded;
        // Reveal an initial chunk so the plots aren't empty.
        self.replay_pos = self.replay_speed.clamp(1, self.replay_all.len());
    }

    fn replay_tick(&mut self) {
        if !(self.replay_loaded && self.replay_playing) {
            return;
        }
        let n = self.replay_speed.max(1);
        self.replay_pos = (self.replay_pos + n).min(self.replay_all.len());
        if self.replay_pos >= self.replay_all.len() {
            self.replay_playing = false;
        }
    }

    fn step_replay(&mut self) {
        if self.replay_loaded {
            self.replay_pos = (self.replay_pos + 1).min(self.replay_all.len());
        }
    }

    fn shown_rows(&self) -> &[TraceRow] {
        &self.replay_all[..self.replay_pos.min(self.replay_all.len())]
    }

    fn scram_now(&self) -> bool {
        if self.replay_loaded {
            self.shown_rows().last().map(|r| r.scram).unwrap_or(false)
        } else {
            self.session.state().is_scram
        }
    }

    fn online_now(&self) -> bool {
        if self.replay_loaded {
            self.shown_rows().last().map(|r| r.online).unwrap_or(true)
        } else {
            self.session.state().is_online
        }
    }

    fn rods_now(&self) -> u16 {
        if self.replay_loaded {
            self.shown_rows().last().map(|r| r.rod_steps).unwrap_or(0)
        } else {
            self.session.state().rod_position
        }
    }

    fn scram_time_for_plot(&self) -> Option<f64> {
        if self.replay_loaded {
            self.replay_all.iter().find(|r| r.scram).map(|r| r.t_s)
        } else {
            self.session
                .history()
                .iter()
                .find(|s| s.is_scram)
                .map(|s| s.time_s)
        }
    }

    fn reason_text(&self) -> String {
        if self.replay_loaded {
            return self
                .replay_all
                .iter()
                .find_map(|r| r.reason.clone())
                .unwrap_or_else(|| "—".to_string());
        }
        self.session
            .trip_reason()
            .map(|r| format!("{r:?}"))
            .unwrap_or_else(|| "—".to_string())
    }

    fn series(&self) -> Series {
        let mut out = Series::default();
        if self.replay_loaded {
            for r in self.shown_rows() {
                out.power.push([r.t_s, r.power_pct]);
                out.flux.push([r.t_s, r.flux_pct]);
                out.core_temp.push([r.t_s, r.core_temp_c]);
                out.sg_temp.push([r.t_s, r.sg_temp_c]);
                out.rcs.push([r.t_s, r.rcs_mpa]);
                out.przr.push([r.t_s, r.przr_mpa]);
                out.sg.push([r.t_s, r.sg_mpa]);
                out.steam.push([r.t_s, r.steam_flow_kg_s]);
                out.turbine.push([r.t_s, r.turbine_mwe]);
            }
        } else {
            for s in self.session.history().iter() {
                out.power.push([s.time_s, s.power_pct]);
                out.flux.push([s.time_s, s.neutron_flux_pct]);
                out.core_temp.push([s.time_s, s.core_temp_c]);
                out.sg_temp.push([s.time_s, s.sg_temp_c]);
                out.rcs.push([s.time_s, s.rcs_pressure_mpa]);
                out.przr.push([s.time_s, s.przr_pressure_mpa]);
                out.sg.push([s.time_s, s.sg_pressure_mpa]);
                out.steam.push([s.time_s, s.steam_flow_kg_s]);
                out.turbine.push([s.time_s, s.turbine_power_mwe]);
            }
        }
        out
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.replay_tick();
        if self.replay_playing {
            ctx.request_repaint();
        }

        if self.running && !self.replay_loaded {
            // Frame hitches are capped; the session carries leftover time.
            let dt = f64::from(ctx.input(|i| i.stable_dt).min(0.25));
            self.session.advance(dt);
            ctx.request_repaint();
        }

        let mode_txt = if self.replay_loaded { "REPLAY" } else { "LIVE" };
        let scram_now = self.scram_now();
        let scram_time = self.scram_time_for_plot();
        let reason_txt = self.reason_text();
        let rod_mode = self.session.state().rod_mode;

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("PWR Trainer Panel");
                ui.separator();
                ui.label(format!("MODE: {mode_txt}"));
                ui.separator();

                let label = if scram_now { "SCRAM: ON" } else { "SCRAM: OFF" };
                let color = if scram_now {
                    egui::Color32::RED
                } else {
                    egui::Color32::GREEN
                };
                ui.colored_label(color, label);
                ui.separator();

                if self.online_now() {
                    ui.colored_label(egui::Color32::GREEN, "GEN ONLINE");
                } else {
                    ui.colored_label(egui::Color32::GRAY, "GEN OFFLINE");
                }

                if let Some(t) = scram_time {
                    ui.separator();
                    ui.label(format!("t_trip = {t:.1}s"));
                    ui.separator();
                    ui.label(format!("cause = {reason_txt}"));
                }
            });
        });

        egui::SidePanel::left("left")
            .resizable(false)
            .show(ctx, |ui| {
                let live_enabled = !self.replay_loaded;

                ui.label("Run");
                ui.horizontal(|ui| {
                    let run_label = if self.running { "Pause" } else { "Run" };
                    if ui
                        .add_enabled(live_enabled, egui::Button::new(run_label))
                        .clicked()
                    {
                        self.running = !self.running;
                    }

                    if ui
                        .add_enabled(live_enabled, egui::Button::new("Step"))
                        .clicked()
                    {
                        let tick = self.session.tick_s();
                        self.session.advance(tick);
                    }

                    if ui.button("Restart").clicked() {
                        self.clear_replay();
                        self.restart_live();
                    }
                });

                ui.add_enabled(
                    live_enabled,
                    egui::DragValue::new(&mut self.seed).prefix("seed: "),
                );

                ui.separator();
                ui.label("Rod control");

                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(
                            live_enabled && !scram_now,
                            egui::SelectableLabel::new(rod_mode == RodMode::Auto, "AUTO"),
                        )
                        .clicked()
                    {
                        self.session.set_rod_mode(RodMode::Auto);
                    }
                    if ui
                        .add_enabled(
                            live_enabled && !scram_now,
                            egui::SelectableLabel::new(rod_mode == RodMode::Manual, "MANUAL"),
                        )
                        .clicked()
                    {
                        self.session.set_rod_mode(RodMode::Manual);
                    }
                    if rod_mode == RodMode::Scram {
                        ui.colored_label(egui::Color32::RED, "SCRAM");
                    }
                });

                if ui
                    .add_enabled(
                        live_enabled,
                        egui::Slider::new(&mut self.setpoint, 50.0..=110.0).text("setpoint (%)"),
                    )
                    .changed()
                {
                    self.session.set_setpoint(self.setpoint);
                }

                let manual = live_enabled && rod_mode == RodMode::Manual && !scram_now;
                ui.horizontal(|ui| {
                    let withdraw = ui.add_enabled(manual, egui::Button::new("Withdraw"));
                    let insert = ui.add_enabled(manual, egui::Button::new("Insert"));
                    if withdraw.is_pointer_button_down_on() {
                        self.session.hold_rods(RodDirection::Withdraw);
                    } else if insert.is_pointer_button_down_on() {
                        self.session.hold_rods(RodDirection::Insert);
                    } else {
                        self.session.release_rods();
                    }
                });

                ui.horizontal(|ui| {
                    for (label, steps) in [("-10", -10), ("-1", -1), ("+1", 1), ("+10", 10)] {
                        if ui.add_enabled(manual, egui::Button::new(label)).clicked() {
                            self.session.nudge_rods(steps);
                        }
                    }
                });

                let rods = self.rods_now();
                ui.add(
                    egui::ProgressBar::new(f32::from(rods) / f32::from(ROD_STEPS_FULL_OUT))
                        .text(format!("rods {rods} / {ROD_STEPS_FULL_OUT}")),
                );

                ui.separator();
                ui.label("Protection");
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(
                            live_enabled && !scram_now,
                            egui::Button::new(
                                egui::RichText::new("SCRAM").strong().color(egui::Color32::WHITE),
                            )
                            .fill(egui::Color32::DARK_RED),
                        )
                        .clicked()
                    {
                        self.session.scram();
                    }

                    if ui
                        .add_enabled(live_enabled && scram_now, egui::Button::new("RESET ×3"))
                        .clicked()
                    {
                        let now = ui.input(|i| i.time);
                        self.reset_clicks.retain(|&t| now - t < RESET_WINDOW_S);
                        self.reset_clicks.push(now);
                        if self.reset_clicks.len() >= 3 {
                            self.reset_clicks.clear();
                            self.session.reset();
                        }
                    }
                });
                if scram_now && !self.reset_clicks.is_empty() {
                    ui.small(format!("reset clicks: {}/3", self.reset_clicks.len()));
                }

                ui.separator();
                ui.label("Replay (JSONL)");
                ui.horizontal(|ui| {
                    ui.label("path:");
                    ui.text_edit_singleline(&mut self.replay_path);
                });
                ui.horizontal(|ui| {
                    if ui.button("Load").clicked() {
                        let p = self.replay_path.clone();
                        self.load_jsonl(&p);
                    }
                    if ui
                        .button(if self.replay_playing { "Pause" } else { "Play" })
                        .clicked()
                        && self.replay_loaded
                    {
                        self.replay_playing = !self.replay_playing;
                        ctx.request_repaint();
                    }
                    if ui.button("Step row").clicked() {
                        self.step_replay();
                    }
                });
                ui.add(
                    egui::Slider::new(&mut self.replay_speed, 1..=200).text("rows/frame"),
                );
                if self.replay_loaded {
                    ui.small(format!(
                        "Loaded: {}/{} rows",
                        self.replay_pos,
                        self.replay_all.len()
                    ));
                } else {
                    ui.small("No replay loaded.");
                }

                if let Some(err) = &self.last_error {
                    ui.separator();
                    ui.colored_label(egui::Color32::RED, err);
                }
            });

        let series = self.series();

        egui::CentralPanel::default().show(ctx, |ui| {
            if series.power.is_empty() {
                ui.label("No data yet. Run LIVE or load a REPLAY trace.");
                return;
            }

            let t_end = series.power.last().map(|p| p[0]).unwrap_or(0.0);
            let limits = *self.session.limits();

            Plot::new("power_plot").height(200.0).show(ui, |plot_ui| {
                plot_ui.line(Line::new(PlotPoints::from(series.power.clone())).name("Power (%)"));
                plot_ui.line(Line::new(PlotPoints::from(series.flux.clone())).name("Flux (%)"));

                if !self.replay_loaded && t_end > 0.0 {
                    let sp = self.session.setpoint_pct();
                    let sp_line: PlotPoints = vec![[0.0, sp], [t_end, sp]].into();
                    let trip_line: PlotPoints =
                        vec![[0.0, limits.trip_power_pct], [t_end, limits.trip_power_pct]].into();
                    plot_ui.line(Line::new(sp_line).name("Setpoint"));
                    plot_ui.line(Line::new(trip_line).name("Trip"));
                }
                if let Some(t) = scram_time {
                    let vline: PlotPoints = vec![[t, 0.0], [t, 125.0]].into();
                    plot_ui.line(Line::new(vline).name("SCRAM"));
                }
            });

            Plot::new("temp_plot").height(150.0).show(ui, |plot_ui| {
                plot_ui.line(Line::new(PlotPoints::from(series.core_temp)).name("Core (°C)"));
                plot_ui.line(Line::new(PlotPoints::from(series.sg_temp)).name("SG (°C)"));
                if !self.replay_loaded && t_end > 0.0 {
                    let trip_line: PlotPoints = vec![
                        [0.0, limits.trip_core_temp_c],
                        [t_end, limits.trip_core_temp_c],
                    ]
                    .into();
                    plot_ui.line(Line::new(trip_line).name("Trip"));
                }
            });

            Plot::new("pressure_plot").height(150.0).show(ui, |plot_ui| {
                plot_ui.line(Line::new(PlotPoints::from(series.rcs)).name("RCS (MPa)"));
                plot_ui.line(Line::new(PlotPoints::from(series.przr)).name("PRZR (MPa)"));
                plot_ui.line(Line::new(PlotPoints::from(series.sg)).name("SG (MPa)"));
            });

            Plot::new("output_plot").height(150.0).show(ui, |plot_ui| {
                plot_ui.line(Line::new(PlotPoints::from(series.steam)).name("Steam (kg/s)"));
                plot_ui.line(Line::new(PlotPoints::from(series.turbine)).name("Turbine (MWe)"));
            });

            ui.separator();
            if self.replay_loaded {
                if let Some(r) = self.shown_rows().last() {
                    ui.label(format!(
                        "t={:.1}s  power={:.1}%  rods={}  Tcore={:.1}°C  RCS={:.2} MPa  SG={:.2} MPa  \
                         steam={:.0} kg/s  SG flow={:.0} kg/s  turbine={:.0} MWe  thermal={:.0} MWt  \
                         vac={:.1} kPa  PRZR lvl={:.1}%  mode={}",
                        r.t_s,
                        r.power_pct,
                        r.rod_steps,
                        r.core_temp_c,
                        r.rcs_mpa,
                        r.sg_mpa,
                        r.steam_flow_kg_s,
                        r.sg_flow_kg_s,
                        r.turbine_mwe,
                        r.thermal_mwt,
                        r.cond_vac_kpa,
                        r.przr_level_pct,
                        r.mode,
                    ));
                }
            } else {
                let s = self.session.state();
                ui.label(format!(
                    "t={:.1}s  power={:.1}%  rods={}  Tcore={:.1}°C  RCS={:.2} MPa  SG={:.2} MPa  \
                     steam={:.0} kg/s  SG flow={:.0} kg/s  turbine={:.0} MWe  thermal={:.0} MWt  \
                     vac={:.1} kPa  PRZR lvl={:.1}%  flux={:.1}%",
                    s.time_s,
                    s.power_pct,
                    s.rod_position,
                    s.core_temp_c,
                    s.rcs_pressure_mpa,
                    s.sg_pressure_mpa,
                    s.steam_flow_kg_s,
                    s.sg_flow_kg_s,
                    s.turbine_power_mwe,
                    s.thermal_power_mwt,
                    s.condenser_vac_kpa,
                    s.przr_level_pct,
                    s.neutron_flux_pct,
                ));
            }
        });
    }
}

fn main() -> eframe::Result<()> {
    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "PWR Trainer Panel",
        native_options,
        Box::new(|_cc| Ok(Box::new(App::default()))),
    )
}

#[cfg(test)]
mod tests {
    use super::{App, TraceRow};

    #[test]
    fn cli_trace_rows_parse() {
        let line = r#"{"t_s":0.6,"power_pct":100.7,"rod_steps":225,"core_temp_c":316.4,
            "rcs_mpa":15.41,"przr_mpa":15.41,"przr_level_pct":60.1,"flux_pct":98.7,
            "sg_mpa":6.81,"sg_temp_c":284.5,"sg_flow_kg_s":1510.2,"steam_flow_kg_s":1510.5,
            "turbine_mwe":986.9,"thermal_mwt":2870.0,"cond_vac_kpa":-95.0,
            "online":true,"scram":false,"mode":"Auto","reason":null}"#;
        let row: TraceRow = serde_json::from_str(line).expect("row parses");
        assert_eq!(row.rod_steps, 225);
        assert!(row.online);
        assert!(!row.scram);
        assert!(row.reason.is_none());
    }

    #[test]
    fn tripped_rows_carry_the_cause() {
        let line = r#"{"t_s":31.2,"power_pct":62.1,"rod_steps":0,"core_temp_c":308.9,
            "rcs_mpa":15.41,"przr_mpa":15.41,"przr_level_pct":60.1,"flux_pct":57.3,
            "sg_mpa":6.81,"sg_temp_c":284.5,"sg_flow_kg_s":1510.2,"steam_flow_kg_s":822.1,
            "turbine_mwe":531.0,"thermal_mwt":1769.9,"cond_vac_kpa":-88.5,
            "online":false,"scram":true,"mode":"Scram","reason":"Manual"}"#;
        let row: TraceRow = serde_json::from_str(line).expect("row parses");
        assert!(row.scram);
        assert_eq!(row.reason.as_deref(), Some("Manual"));
        assert_eq!(row.mode, "Scram");
    }

    #[test]
    fn rod_indicator_follows_the_replay_cursor() {
        let line = r#"{"t_s":75.0,"power_pct":97.4,"rod_steps":57,"core_temp_c":328.6,
            "rcs_mpa":15.57,"przr_mpa":15.57,"przr_level_pct":59.6,"flux_pct":95.5,
            "sg_mpa":6.75,"sg_temp_c":282.3,"sg_flow_kg_s":1461.0,"steam_flow_kg_s":1461.0,
            "turbine_mwe":954.5,"thermal_mwt":2775.9,"cond_vac_kpa":-94.8,
            "online":true,"scram":false,"mode":"Auto","reason":null}"#;

        let mut app = App::default();
        assert_eq!(app.rods_now(), app.session.state().rod_position);

        app.replay_all = vec![serde_json::from_str(line).expect("row parses")];
        app.replay_loaded = true;
        app.replay_pos = 1;
        assert_eq!(app.rods_now(), 57);

        // Before the cursor reveals a row there is nothing to indicate.
        app.replay_pos = 0;
        assert_eq!(app.rods_now(), 0);
    }
}
