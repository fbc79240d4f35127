//! Fit Engine CLI
//!
//! A small command-line front end over `fit_engine`: load a static data
//! fixture (or fall back to the bundled demonstration fixture), assemble
//! a fit, and query effective attribute values. This binary exists to
//! demonstrate the library, not to be a fitting tool.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fit_data::{AttributeId, InMemoryStaticDataCache, StaticDataCache, TypeId};
use fit_engine::{Fit, Holder, HolderKind};
use fit_services::EngineSettings;

/// Type ids the bundled demonstration fixture uses for its ship,
/// character, and module.
const DEMO_SHIP_TYPE: u32 = 20;
const DEMO_CHARACTER_TYPE: u32 = 10;
const DEMO_MODULE_TYPE: u32 = 30;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Query effective attributes over a ship fit", long_about = None)]
struct Args {
    /// Path to a JSON-serialized static data fixture. Falls back to the
    /// bundled demonstration fixture when omitted.
    #[clap(long, global = true)]
    data: Option<PathBuf>,

    /// Path to an `EngineSettings` TOML file; falls back to defaults if absent.
    #[clap(long, global = true)]
    settings: Option<PathBuf>,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one item type's static data.
    ShowType {
        /// Numeric item type id to print.
        id: u32,
    },
    /// Assemble the demonstration fit (ship, module, character) and
    /// print the module's modified attribute before the character
    /// attaches, while it's attached, and after it detaches again.
    ShowFit,
    /// Read one attribute off one holder in the demonstration fit,
    /// identified by its item type id.
    ReadAttr {
        /// Item type id of the holder to read from (ship/character/module).
        holder: u32,
        /// Attribute id to read.
        attr: u32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let cache = load_cache(args.data.as_deref())?;
    let settings = match &args.settings {
        Some(path) => EngineSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => EngineSettings::default(),
    };

    match args.cmd {
        Command::ShowType { id } => show_type(&cache, id),
        Command::ShowFit => show_fit(&cache, settings),
        Command::ReadAttr { holder, attr } => read_attr(&cache, settings, holder, attr),
    }
}

fn load_cache(data: Option<&std::path::Path>) -> Result<InMemoryStaticDataCache> {
    match data {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading static data fixture {}", path.display()))?;
            InMemoryStaticDataCache::from_json(&text)
                .with_context(|| format!("parsing static data fixture {}", path.display()))
        }
        None => Ok(demo_fixture()),
    }
}

fn show_type(cache: &InMemoryStaticDataCache, id: u32) -> Result<()> {
    let item = cache
        .get_type(TypeId::new(id))
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    println!("{item:#?}");
    Ok(())
}

/// Attaches the ship and module, reads the module's modified attribute,
/// attaches the character and reads it again, then detaches the
/// character and reads it a third time to show the value return to its
/// earlier state.
fn show_fit(cache: &InMemoryStaticDataCache, settings: EngineSettings) -> Result<()> {
    let mut fit = Fit::new(settings);
    fit.attach(cache, Holder::new(HolderKind::Ship, TypeId::new(DEMO_SHIP_TYPE)))
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let module_id = fit
        .attach(cache, Holder::new(HolderKind::Module, TypeId::new(DEMO_MODULE_TYPE)))
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let before = fit
        .attribute(cache, module_id, AttributeId::new(3))
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    println!("module attr3 before character attached: {before}");

    let character_id = fit
        .attach(cache, Holder::new(HolderKind::Character, TypeId::new(DEMO_CHARACTER_TYPE)))
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let after = fit
        .attribute(cache, module_id, AttributeId::new(3))
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    println!("module attr3 with character attached:  {after}");

    fit.detach(cache, character_id)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let restored = fit
        .attribute(cache, module_id, AttributeId::new(3))
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    println!("module attr3 after character detached: {restored}");

    Ok(())
}

/// Assembles the same demonstration fit as [`show_fit`] with every
/// holder attached, then reads one attribute off whichever attached
/// holder carries the given item type id.
fn read_attr(cache: &InMemoryStaticDataCache, settings: EngineSettings, holder: u32, attr: u32) -> Result<()> {
    let mut fit = Fit::new(settings);
    let ship_id = fit
        .attach(cache, Holder::new(HolderKind::Ship, TypeId::new(DEMO_SHIP_TYPE)))
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let module_id = fit
        .attach(cache, Holder::new(HolderKind::Module, TypeId::new(DEMO_MODULE_TYPE)))
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let character_id = fit
        .attach(cache, Holder::new(HolderKind::Character, TypeId::new(DEMO_CHARACTER_TYPE)))
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let holder_id = match holder {
        DEMO_SHIP_TYPE => ship_id,
        DEMO_MODULE_TYPE => module_id,
        DEMO_CHARACTER_TYPE => character_id,
        other => anyhow::bail!("holder type {other} is not part of the demonstration fit"),
    };

    let value = fit
        .attribute(cache, holder_id, AttributeId::new(attr))
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    println!("{value}");
    Ok(())
}

/// The bundled demonstration fixture: a character grants a percentage
/// bonus to the ship's second attribute, which in turn grants a
/// percentage bonus to every fitted module's third attribute.
fn demo_fixture() -> InMemoryStaticDataCache {
    use fit_data::{CategoryId, Effect, EffectCategory, FilterType, GroupId, ItemType, Location, ModifierRecord};

    fn modifier(location: Location, filter_type: FilterType, source_attr: u32, target_attr: u32) -> ModifierRecord {
        ModifierRecord {
            state: fit_data::HolderState::Offline,
            context: fit_data::Context::Local,
            location,
            filter_type,
            filter_value: None,
            operator: fit_data::Operator::PostPercent,
            source_attribute_id: AttributeId::new(source_attr),
            target_attribute_id: AttributeId::new(target_attr),
        }
    }

    let character_item = ItemType::new(TypeId::new(DEMO_CHARACTER_TYPE), GroupId::new(1), CategoryId::new(1))
        .with_attribute(AttributeId::new(1), 5.0)
        .with_effect(
            Effect::new(EffectCategory::Passive).with_modifier(modifier(Location::Ship, FilterType::None, 1, 2)),
        );
    let ship_item = ItemType::new(TypeId::new(DEMO_SHIP_TYPE), GroupId::new(1), CategoryId::new(1))
        .with_attribute(AttributeId::new(2), 7.5)
        .with_effect(
            Effect::new(EffectCategory::Passive).with_modifier(modifier(Location::Ship, FilterType::All, 2, 3)),
        );
    let module_item = ItemType::new(TypeId::new(DEMO_MODULE_TYPE), GroupId::new(1), CategoryId::new(1))
        .with_attribute(AttributeId::new(3), 0.5);

    let mut cache = InMemoryStaticDataCache::new();
    cache.insert_type(character_item);
    cache.insert_type(ship_item);
    cache.insert_type(module_item);
    cache.insert_attribute(fit_data::AttributeMeta::new(AttributeId::new(1)).stackable(true));
    cache.insert_attribute(fit_data::AttributeMeta::new(AttributeId::new(2)).stackable(true));
    cache.insert_attribute(fit_data::AttributeMeta::new(AttributeId::new(3)).stackable(true));
    cache
}
