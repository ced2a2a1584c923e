/// Terminal host for the dentview core: ASCII rasterizer with mouse orbit controls
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use dentview_core::scene::VISIBILITY_THRESHOLD;
use dentview_core::{Camera, MeshLoader, PointerButton, Scene, TriangleMesh, ViewerConfig};
use std::io::{self, stdout, Write};
use std::time::Duration;
use web_time::Instant;

pub mod renderer;

pub use renderer::AsciiRenderer;

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f32 = 2.0;

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    scene: Scene,
    meshes: Vec<Option<TriangleMesh>>,
    loader: MeshLoader,
    renderer: AsciiRenderer,
    status: String,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(config: ViewerConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let slots = config.parts.len();
        let scene = Scene::from_config(config, Camera::new(width as u32, height as u32), (width as u32, height as u32));

        let mut app = Self {
            scene,
            meshes: vec![None; slots],
            loader: MeshLoader::new(),
            renderer: AsciiRenderer::new(width as usize, height as usize),
            status: String::new(),
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        };
        app.resize(width, height);
        Ok(app)
    }

    /// Decode `bytes` in the background and show the result on part `slot`
    pub fn load(&mut self, slot: usize, bytes: Vec<u8>) -> io::Result<()> {
        if slot >= self.meshes.len() {
            log::warn!("ignoring mesh for slot {slot}: only {} parts configured", self.meshes.len());
            return Ok(());
        }

        self.loader
            .request(slot, bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
    }

    /// Show `mesh` on part `slot` right away; call [`Self::fit_camera`] once all parts are in
    pub fn set_mesh(&mut self, slot: usize, mut mesh: TriangleMesh) {
        let Some(target) = self.meshes.get_mut(slot) else {
            return;
        };

        mesh.center();
        *target = Some(mesh);
    }

    /// Frame every loaded part across its whole motion
    pub fn fit_camera(&mut self) {
        let bounds = self
            .meshes
            .iter()
            .enumerate()
            .filter_map(|(slot, mesh)| Some((slot, mesh.as_ref()?.bounding_box()?)));
        if self.scene.fit_parts(bounds).is_none() {
            log::debug!("no visible part to frame");
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        self.loader.cancel();
        self.scene.dispose();
        execute!(stdout(), cursor::Show, DisableMouseCapture, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?)?;
            }

            self.collect_loads();
            self.scene.frame(Instant::now());
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn collect_loads(&mut self) {
        let mut loaded = false;
        for (slot, result) in self.loader.poll() {
            match result {
                Ok(mesh) => {
                    log::info!("part {slot}: {} triangles", mesh.triangle_count());
                    self.status = format!("loaded part {slot}");
                    self.set_mesh(slot, mesh);
                    loaded = true;
                }
                Err(e) => {
                    log::warn!("part {slot}: {e}");
                    self.status = format!("part {slot}: {e}");
                }
            }
        }

        if loaded && self.loader.pending() == 0 {
            self.fit_camera();
        }
    }

    fn handle_event(&mut self, event: Event) -> io::Result<()> {
        match event {
            Event::Key(KeyEvent { code: KeyCode::Char('q') | KeyCode::Esc, .. }) => {
                self.running = false;
            }
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => self.resize(width, height),
            _ => {}
        }
        Ok(())
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let now = Instant::now();
        let (x, y) = (mouse.column as f32, mouse.row as f32);
        let controls = self.scene.controller_mut();

        match mouse.kind {
            MouseEventKind::Down(button) => controls.on_pointer_down(pointer_button(button), x, y, now),
            MouseEventKind::Drag(_) => controls.on_pointer_move(x, y),
            MouseEventKind::Up(_) => controls.on_pointer_up(now),
            MouseEventKind::ScrollUp => controls.on_wheel(-1.0, now),
            MouseEventKind::ScrollDown => controls.on_wheel(1.0, now),
            _ => {}
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.renderer.resize(width as usize, height as usize);

        let controls = self.scene.controller_mut();
        controls.set_viewport(width as u32, height as u32);
        if height > 0 {
            controls.camera_mut().aspect = width as f32 / (height as f32 * CELL_ASPECT);
        }
    }

    fn render(&mut self) -> io::Result<()> {
        self.renderer.clear();

        for (mesh, state) in self.meshes.iter().zip(self.scene.parts()) {
            let Some(mesh) = mesh else {
                continue;
            };
            if !state.is_visible(VISIBILITY_THRESHOLD) {
                continue;
            }
            self.renderer.render_part(mesh, state, self.scene.camera());
        }

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;

        let pending = self.loader.pending();
        let loading = if pending > 0 { format!(" | loading {pending}") } else { String::new() };
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "dentview | FPS: {:.1} | rotation: {:.0}° | drag=orbit middle=pan wheel=zoom q=quit{loading} {}",
                self.fps,
                self.scene.controller().rotation().to_degrees(),
                self.status
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

fn pointer_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Middle => PointerButton::Auxiliary,
        MouseButton::Right => PointerButton::Secondary,
    }
}
