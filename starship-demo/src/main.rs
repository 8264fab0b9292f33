use helium::config::UniverseConfig;
use helium::input::Control;
use helium::ship::TileGrid;
use helium::tiles::{Engine, Plating, Turret};
use helium::universe::Universe;
use helium::window::UniverseHandler;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod textures;

const SHIP_WIDTH: u32 = 5;
const SHIP_HEIGHT: u32 = 8;

struct Demo {
    ship: Option<TileGrid>,
}

impl UniverseHandler for Demo {
    fn window_title(&self) -> &str {
        "helium starship"
    }

    fn init(&mut self, universe: &mut Universe) -> helium::Result<()> {
        let atlas = universe.atlas_mut();
        let hull = atlas.register(&textures::hull()?)?;
        let engine_off = atlas.register(&textures::engine(false)?)?;
        let engine_on = atlas.register(&textures::engine(true)?)?;
        let mount = atlas.register(&textures::turret_mount()?)?;
        let gun = atlas.register(&textures::turret_gun()?)?;

        let config = universe.config().clone();
        let plating = universe.add_behavior(Plating::new(hull));
        let engine = universe.add_behavior(Engine::new(engine_off, engine_on, &config.engine));
        let turret = universe.add_behavior(Turret::new(mount, gun, &config.turret));

        let mut ship = TileGrid::new(SHIP_WIDTH, SHIP_HEIGHT, &config.ship);
        for y in 0..SHIP_HEIGHT {
            for x in 0..SHIP_WIDTH {
                let behavior = match (x, y) {
                    (0, _) | (4, _) if y > 5 => None,
                    (1, 0) | (3, 0) => Some(engine),
                    (2, 6) => Some(turret),
                    _ => Some(plating),
                };
                ship.set(x, y, behavior)?;
            }
        }
        self.ship = Some(ship);
        Ok(())
    }

    fn scene(&mut self, universe: &mut Universe) -> helium::Result<()> {
        match self.ship.as_mut() {
            Some(ship) => ship.render(universe),
            None => Ok(()),
        }
    }

    fn on_control(&mut self, _universe: &mut Universe, control: Control) {
        if control == Control::ResetZoom {
            info!("zoom reset");
        }
    }
}

fn main() -> helium::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "helium=info".into()))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!(%path, "loading config");
            UniverseConfig::load(path)?
        }
        None => UniverseConfig::default(),
    };

    helium::window::start(Demo { ship: None }, config);
    Ok(())
}
