//! Option Resolver
//!
//! Layers a complete transform configuration out of hard-coded defaults,
//! booleans derived from the resolved assumptions, and explicit caller
//! overrides. Precedence is defaults < derived < overrides; the overrides
//! are applied last by an explicit field-by-field overlay.

use serde::{Deserialize, Serialize};

use crate::assumptions::Assumptions;
use crate::environment::{default_node_env, NODE_ENV_PRODUCTION};
use crate::registry::IdentifierNamesCache;
use crate::reserved::all_reserved_names;
use crate::target::ObfuscatorTarget;

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMERATED KNOBS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentifierNamesGenerator {
    Dictionary,
    Hexadecimal,
    Mangled,
    MangledShuffled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptionsPreset {
    Default,
    LowObfuscation,
    MediumObfuscation,
    HighObfuscation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenamePropertiesMode {
    Safe,
    Unsafe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMapMode {
    Inline,
    Separate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceMapSourcesMode {
    Sources,
    SourcesContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringArrayEncoding {
    None,
    Base64,
    Rc4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StringArrayIndexesType {
    HexadecimalNumber,
    HexadecimalNumericString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringArrayWrappersType {
    Variable,
    Function,
}

// ═══════════════════════════════════════════════════════════════════════════════
// FULL CONFIGURATION RECORD
// ═══════════════════════════════════════════════════════════════════════════════

/// The complete, fully-populated transform configuration handed to the
/// external engine. Mutable during the pre-obfuscation hook, a value
/// otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObfuscatorOptions {
    pub compact: bool,
    pub control_flow_flattening: bool,
    pub control_flow_flattening_threshold: f64,
    pub dead_code_injection: bool,
    pub dead_code_injection_threshold: f64,
    pub debug_protection: bool,
    /// Milliseconds between debug-protection probes.
    pub debug_protection_interval: u32,
    pub disable_console_output: bool,
    pub domain_lock: Vec<String>,
    pub domain_lock_redirect_url: String,
    pub force_transform_strings: Vec<String>,
    /// The rename registry the engine reads and extends. The orchestrator
    /// injects the shared per-run registry here before each transform.
    pub identifier_names_cache: Option<IdentifierNamesCache>,
    pub identifier_names_generator: IdentifierNamesGenerator,
    pub identifiers_dictionary: Vec<String>,
    pub identifiers_prefix: String,
    pub ignore_imports: bool,
    pub ignore_require_imports: bool,
    pub input_file_name: String,
    pub log: bool,
    pub numbers_to_expressions: bool,
    pub options_preset: OptionsPreset,
    pub rename_globals: bool,
    pub rename_properties: bool,
    pub rename_properties_mode: RenamePropertiesMode,
    pub reserved_names: Vec<String>,
    pub reserved_strings: Vec<String>,
    pub seed: String,
    pub self_defending: bool,
    pub simplify: bool,
    pub source_map: bool,
    pub source_map_base_url: String,
    pub source_map_file_name: String,
    pub source_map_mode: SourceMapMode,
    pub source_map_sources_mode: SourceMapSourcesMode,
    pub split_strings: bool,
    pub split_strings_chunk_length: u32,
    pub string_array: bool,
    pub string_array_calls_transform: bool,
    pub string_array_calls_transform_threshold: f64,
    pub string_array_encoding: Vec<StringArrayEncoding>,
    pub string_array_indexes_type: Vec<StringArrayIndexesType>,
    pub string_array_index_shift: bool,
    pub string_array_rotate: bool,
    pub string_array_shuffle: bool,
    pub string_array_threshold: f64,
    pub string_array_wrappers_chained_calls: bool,
    pub string_array_wrappers_count: u32,
    pub string_array_wrappers_parameters_max_count: u32,
    pub string_array_wrappers_type: StringArrayWrappersType,
    pub target: ObfuscatorTarget,
    pub transform_object_keys: bool,
    pub unicode_escape_sequence: bool,
}

/// All-optional mirror of [`ObfuscatorOptions`], applied last in the
/// layering. Every set field wins over defaults and derived values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObfuscatorOptionsOverrides {
    pub compact: Option<bool>,
    pub control_flow_flattening: Option<bool>,
    pub control_flow_flattening_threshold: Option<f64>,
    pub dead_code_injection: Option<bool>,
    pub dead_code_injection_threshold: Option<f64>,
    pub debug_protection: Option<bool>,
    pub debug_protection_interval: Option<u32>,
    pub disable_console_output: Option<bool>,
    pub domain_lock: Option<Vec<String>>,
    pub domain_lock_redirect_url: Option<String>,
    pub force_transform_strings: Option<Vec<String>>,
    pub identifier_names_cache: Option<IdentifierNamesCache>,
    pub identifier_names_generator: Option<IdentifierNamesGenerator>,
    pub identifiers_dictionary: Option<Vec<String>>,
    pub identifiers_prefix: Option<String>,
    pub ignore_imports: Option<bool>,
    pub ignore_require_imports: Option<bool>,
    pub input_file_name: Option<String>,
    pub log: Option<bool>,
    pub numbers_to_expressions: Option<bool>,
    pub options_preset: Option<OptionsPreset>,
    pub rename_globals: Option<bool>,
    pub rename_properties: Option<bool>,
    pub rename_properties_mode: Option<RenamePropertiesMode>,
    pub reserved_names: Option<Vec<String>>,
    pub reserved_strings: Option<Vec<String>>,
    pub seed: Option<String>,
    pub self_defending: Option<bool>,
    pub simplify: Option<bool>,
    pub source_map: Option<bool>,
    pub source_map_base_url: Option<String>,
    pub source_map_file_name: Option<String>,
    pub source_map_mode: Option<SourceMapMode>,
    pub source_map_sources_mode: Option<SourceMapSourcesMode>,
    pub split_strings: Option<bool>,
    pub split_strings_chunk_length: Option<u32>,
    pub string_array: Option<bool>,
    pub string_array_calls_transform: Option<bool>,
    pub string_array_calls_transform_threshold: Option<f64>,
    pub string_array_encoding: Option<Vec<StringArrayEncoding>>,
    pub string_array_indexes_type: Option<Vec<StringArrayIndexesType>>,
    pub string_array_index_shift: Option<bool>,
    pub string_array_rotate: Option<bool>,
    pub string_array_shuffle: Option<bool>,
    pub string_array_threshold: Option<f64>,
    pub string_array_wrappers_chained_calls: Option<bool>,
    pub string_array_wrappers_count: Option<u32>,
    pub string_array_wrappers_parameters_max_count: Option<u32>,
    pub string_array_wrappers_type: Option<StringArrayWrappersType>,
    pub target: Option<ObfuscatorTarget>,
    pub transform_object_keys: Option<bool>,
    pub unicode_escape_sequence: Option<bool>,
}

macro_rules! overlay {
    ($options:ident, $overrides:ident, { $($field:ident),* $(,)? }) => {
        $(
            if let Some(value) = &$overrides.$field {
                $options.$field = value.clone();
            }
        )*
    };
}

impl ObfuscatorOptionsOverrides {
    /// Final overlay step: every set field replaces the resolved value.
    pub fn apply_to(&self, options: &mut ObfuscatorOptions) {
        overlay!(options, self, {
            compact,
            control_flow_flattening,
            control_flow_flattening_threshold,
            dead_code_injection,
            dead_code_injection_threshold,
            debug_protection,
            debug_protection_interval,
            disable_console_output,
            domain_lock,
            domain_lock_redirect_url,
            force_transform_strings,
            identifier_names_generator,
            identifiers_dictionary,
            identifiers_prefix,
            ignore_imports,
            ignore_require_imports,
            input_file_name,
            log,
            numbers_to_expressions,
            options_preset,
            rename_globals,
            rename_properties,
            rename_properties_mode,
            reserved_names,
            reserved_strings,
            seed,
            self_defending,
            simplify,
            source_map,
            source_map_base_url,
            source_map_file_name,
            source_map_mode,
            source_map_sources_mode,
            split_strings,
            split_strings_chunk_length,
            string_array,
            string_array_calls_transform,
            string_array_calls_transform_threshold,
            string_array_encoding,
            string_array_indexes_type,
            string_array_index_shift,
            string_array_rotate,
            string_array_shuffle,
            string_array_threshold,
            string_array_wrappers_chained_calls,
            string_array_wrappers_count,
            string_array_wrappers_parameters_max_count,
            string_array_wrappers_type,
            target,
            transform_object_keys,
            unicode_escape_sequence,
        });

        if let Some(cache) = &self.identifier_names_cache {
            options.identifier_names_cache = Some(cache.clone());
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════════

const DEBUG_PROTECTION_INTERVAL_DEVELOPMENT_MS: u32 = 120_000;
const DEBUG_PROTECTION_INTERVAL_PRODUCTION_MS: u32 = 4_000;

/// A fresh cryptographically random 512-bit seed, hex encoded. Generated per
/// resolution call: seeds vary per asset while identifier names stay
/// consistent through the shared registry.
///
/// # Panics
///
/// Panics when the operating system cannot supply randomness; a resolved
/// configuration without a real seed must never be handed to the engine.
pub fn generate_seed() -> String {
    let mut bytes = [0u8; 64];
    getrandom::getrandom(&mut bytes).expect("system randomness unavailable");
    hex::encode(bytes)
}

/// Produces a complete configuration for one asset.
pub fn resolve_obfuscator_options(
    assumptions: &Assumptions,
    overrides: Option<&ObfuscatorOptionsOverrides>,
) -> ObfuscatorOptions {
    let default_overrides = ObfuscatorOptionsOverrides::default();
    let overrides = overrides.unwrap_or(&default_overrides);

    let node_env = assumptions
        .node_env
        .clone()
        .unwrap_or_else(default_node_env);
    let is_production = node_env == NODE_ENV_PRODUCTION;
    let is_development = !is_production;

    let target = overrides
        .target
        .or(assumptions.target)
        .unwrap_or(ObfuscatorTarget::Browser);

    let is_browser = target.is_browser();
    let is_node = !is_browser;

    let debug_protection = !is_node;
    let debug_protection_interval = if is_development {
        DEBUG_PROTECTION_INTERVAL_DEVELOPMENT_MS
    } else {
        DEBUG_PROTECTION_INTERVAL_PRODUCTION_MS
    };

    let disable_console_output = is_production && !is_node;

    let domain_lock_redirect_url = overrides
        .domain_lock_redirect_url
        .clone()
        .unwrap_or_else(|| "about:blank".to_string());

    let identifier_names_cache = Some(
        overrides
            .identifier_names_cache
            .clone()
            .unwrap_or_default(),
    );

    let reserved_names = overrides
        .reserved_names
        .clone()
        .unwrap_or_else(all_reserved_names);

    let seed = overrides.seed.clone().unwrap_or_else(generate_seed);

    let self_defending = is_node;
    let simplify = is_browser;

    // An explicit encoding list is kept exactly as given; only an absent
    // list defaults to rc4.
    let string_array_encoding = overrides
        .string_array_encoding
        .clone()
        .unwrap_or_else(|| vec![StringArrayEncoding::Rc4]);

    let string_array_index_shift = is_node;
    let string_array_rotate = is_node;

    let mut options = ObfuscatorOptions {
        compact: true,
        control_flow_flattening: false,
        control_flow_flattening_threshold: 0.05,
        dead_code_injection: false,
        dead_code_injection_threshold: 0.05,
        debug_protection,
        debug_protection_interval,
        disable_console_output,
        domain_lock: Vec::new(),
        domain_lock_redirect_url,
        force_transform_strings: Vec::new(),
        identifier_names_cache,
        identifier_names_generator: IdentifierNamesGenerator::Hexadecimal,
        identifiers_dictionary: Vec::new(),
        identifiers_prefix: String::new(),
        ignore_imports: true,
        ignore_require_imports: true,
        input_file_name: String::new(),
        log: false,
        numbers_to_expressions: false,
        options_preset: OptionsPreset::Default,
        rename_globals: false,
        rename_properties: false,
        rename_properties_mode: RenamePropertiesMode::Safe,
        reserved_names,
        reserved_strings: Vec::new(),
        seed,
        self_defending,
        simplify,
        source_map: true,
        source_map_base_url: String::new(),
        source_map_file_name: String::new(),
        source_map_mode: SourceMapMode::Separate,
        source_map_sources_mode: SourceMapSourcesMode::SourcesContent,
        split_strings: false,
        split_strings_chunk_length: 5,
        string_array: false,
        string_array_calls_transform: false,
        string_array_calls_transform_threshold: 0.05,
        string_array_encoding,
        string_array_indexes_type: vec![StringArrayIndexesType::HexadecimalNumber],
        string_array_index_shift,
        string_array_rotate,
        string_array_shuffle: false,
        string_array_threshold: 0.05,
        string_array_wrappers_chained_calls: false,
        string_array_wrappers_count: 1,
        string_array_wrappers_parameters_max_count: 2,
        string_array_wrappers_type: StringArrayWrappersType::Variable,
        target,
        transform_object_keys: false,
        unicode_escape_sequence: false,
    };

    overrides.apply_to(&mut options);

    options
}
