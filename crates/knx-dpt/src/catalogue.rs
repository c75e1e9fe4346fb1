use crate::{Charset, Codec, Transcoder, Width};

const U8: Codec = Codec::Int {
    width: Width::One,
    signed: false,
};
const I8: Codec = Codec::Int {
    width: Width::One,
    signed: true,
};
const U16: Codec = Codec::Int {
    width: Width::Two,
    signed: false,
};
const I16: Codec = Codec::Int {
    width: Width::Two,
    signed: true,
};
const U32: Codec = Codec::Int {
    width: Width::Four,
    signed: false,
};
const I32: Codec = Codec::Int {
    width: Width::Four,
    signed: true,
};
const F32: Codec = Codec::Float32;

/// Full range of the 2-byte float format.
const F16_MIN: f64 = -671_088.64;
const F16_MAX: f64 = 670_760.96;
const F16: Codec = float16(F16_MIN, F16_MAX);
const F16_SYMMETRIC: Codec = float16(-670_760.0, 670_760.0);
const F16_POSITIVE: Codec = float16(0.0, 670_760.0);

const fn float16(min: f64, max: f64) -> Codec {
    Codec::Float16 { min, max }
}

const fn scaled(width: Width, signed: bool, numerator: u32, denominator: u32) -> Codec {
    Codec::ScaledInt {
        width,
        signed,
        numerator,
        denominator,
    }
}

const fn t(
    value_type: &'static str,
    main: u16,
    sub: Option<u16>,
    unit: Option<&'static str>,
    codec: Codec,
) -> Transcoder {
    Transcoder::new(value_type, main, sub, unit, codec)
}

/// Every known transcoder, in registration order.
pub static TRANSCODERS: &[Transcoder] = &[
    t("1byte_signed", 6, None, None, I8),
    t("1byte_unsigned", 5, None, None, U8),
    t("2byte_float", 9, None, None, F16),
    t("2byte_signed", 8, None, None, I16),
    t("2byte_unsigned", 7, None, None, U16),
    t("4byte_float", 14, None, None, F32),
    t("4byte_signed", 13, None, None, I32),
    t("4byte_unsigned", 12, None, None, U32),
    t("absolute_humidity", 9, Some(29), Some("g/m³"), F16_POSITIVE),
    t("absolute_temperature", 14, Some(69), Some("K"), F32),
    t("acceleration", 14, Some(0), Some("m/s²"), F32),
    t("acceleration_angular", 14, Some(1), Some("rad/s²"), F32),
    t("activation_energy", 14, Some(2), Some("J/mol"), F32),
    t("active_energy", 13, Some(10), Some("Wh"), I32),
    t("active_energy_kwh", 13, Some(13), Some("kWh"), I32),
    t("active_energy_mwh", 13, Some(16), Some("MWh"), I32),
    t("activity", 14, Some(3), Some("s⁻¹"), F32),
    t("air_flow", 9, Some(9), Some("m³/h"), F16_SYMMETRIC),
    t("amplitude", 14, Some(5), None, F32),
    t("angle", 5, Some(3), Some("°"), Codec::Linear { max: 360.0 }),
    t("angle_deg", 14, Some(7), Some("°"), F32),
    t("angle_rad", 14, Some(6), Some("rad"), F32),
    t("angular_frequency", 14, Some(34), Some("rad/s"), F32),
    t("angular_momentum", 14, Some(8), Some("J s"), F32),
    t("angular_velocity", 14, Some(9), Some("rad/s"), F32),
    t("apparant_energy", 13, Some(11), Some("VAh"), I32),
    t("apparant_energy_kvah", 13, Some(14), Some("kVAh"), I32),
    t("apparent_power", 14, Some(80), Some("VA"), F32),
    t("area", 14, Some(10), Some("m²"), F32),
    t("brightness", 7, Some(13), Some("lx"), U16),
    t("capacitance", 14, Some(11), Some("F"), F32),
    t("charge_density_surface", 14, Some(12), Some("C/m²"), F32),
    t("charge_density_volume", 14, Some(13), Some("C/m³"), F32),
    t("color_temperature", 7, Some(600), Some("K"), U16),
    t("common_temperature", 14, Some(68), Some("°C"), F32),
    t("compressibility", 14, Some(14), Some("m²/N"), F32),
    t("concentration_ugm3", 9, Some(30), Some("μg/m³"), F16_POSITIVE),
    t("conductance", 14, Some(15), Some("S"), F32),
    t("counter_pulses", 6, Some(10), Some("counter pulses"), I8),
    t("curr", 9, Some(21), Some("mA"), F16_SYMMETRIC),
    t("current", 7, Some(12), Some("mA"), U16),
    t("decimal_factor", 5, Some(5), None, U8),
    t("delta_time_100ms", 8, Some(4), Some("ms"), scaled(Width::Two, true, 100, 1)),
    t("delta_time_10ms", 8, Some(3), Some("ms"), scaled(Width::Two, true, 10, 1)),
    t("delta_time_hrs", 8, Some(7), Some("h"), I16),
    t("delta_time_min", 8, Some(6), Some("min"), I16),
    t("delta_time_ms", 8, Some(2), Some("ms"), I16),
    t("delta_time_sec", 8, Some(5), Some("s"), I16),
    t("density", 14, Some(17), Some("kg/m³"), F32),
    t("electric_charge", 14, Some(18), Some("C"), F32),
    t("electric_current", 14, Some(19), Some("A"), F32),
    t("electric_current_density", 14, Some(20), Some("A/m²"), F32),
    t("electric_dipole_moment", 14, Some(21), Some("C m"), F32),
    t("electric_displacement", 14, Some(22), Some("C/m²"), F32),
    t("electric_field_strength", 14, Some(23), Some("V/m"), F32),
    t("electric_flux", 14, Some(24), Some("c"), F32),
    t("electric_flux_density", 14, Some(25), Some("C/m²"), F32),
    t("electric_polarization", 14, Some(26), Some("C/m²"), F32),
    t("electric_potential", 14, Some(27), Some("V"), F32),
    t("electric_potential_difference", 14, Some(28), Some("V"), F32),
    t("electrical_conductivity", 14, Some(16), Some("S/m"), F32),
    t("electromagnetic_moment", 14, Some(29), Some("A m²"), F32),
    t("electromotive_force", 14, Some(30), Some("V"), F32),
    t("energy", 14, Some(31), Some("J"), F32),
    t("enthalpy", 9, Some(60000), Some("H"), F16),
    t("flow_rate_m3h", 13, Some(2), Some("m³/h"), scaled(Width::Four, true, 1, 10_000)),
    t("force", 14, Some(32), Some("N"), F32),
    t("frequency", 14, Some(33), Some("Hz"), F32),
    t("heat_quantity", 14, Some(37), Some("J"), F32),
    t("heatcapacity", 14, Some(35), Some("J/K"), F32),
    t("heatflowrate", 14, Some(36), Some("W"), F32),
    t("humidity", 9, Some(7), Some("%"), F16_POSITIVE),
    t("illuminance", 9, Some(4), Some("lx"), F16_POSITIVE),
    t("impedance", 14, Some(38), Some("Ω"), F32),
    t("kelvin_per_percent", 9, Some(23), Some("K/%"), F16_SYMMETRIC),
    t("latin_1", 16, Some(1), None, Codec::Text { charset: Charset::Latin1 }),
    t("length", 14, Some(39), Some("m"), F32),
    t("length_m", 8, Some(12), Some("m"), I16),
    t("length_mm", 7, Some(11), Some("mm"), U16),
    t("light_quantity", 14, Some(40), Some("lm s"), F32),
    t("long_delta_timesec", 13, Some(100), Some("s"), I32),
    t("long_time_period_hrs", 12, Some(102), Some("h"), U32),
    t("long_time_period_min", 12, Some(101), Some("min"), U32),
    t("long_time_period_sec", 12, Some(100), Some("s"), U32),
    t("luminance", 14, Some(41), Some("cd/m²"), F32),
    t("luminous_flux", 14, Some(42), Some("lm"), F32),
    t("luminous_intensity", 14, Some(43), Some("cd"), F32),
    t("magnetic_field_strength", 14, Some(44), Some("A/m"), F32),
    t("magnetic_flux", 14, Some(45), Some("Wb"), F32),
    t("magnetic_flux_density", 14, Some(46), Some("T"), F32),
    t("magnetic_moment", 14, Some(47), Some("A m²"), F32),
    t("magnetic_polarization", 14, Some(48), Some("T"), F32),
    t("magnetization", 14, Some(49), Some("A/m"), F32),
    t("magnetomotive_force", 14, Some(50), Some("A"), F32),
    t("mass", 14, Some(51), Some("kg"), F32),
    t("mass_flux", 14, Some(52), Some("kg/s"), F32),
    t("mol", 14, Some(4), Some("mol"), F32),
    t("momentum", 14, Some(53), Some("N/s"), F32),
    t("percent", 5, Some(1), Some("%"), Codec::Linear { max: 100.0 }),
    t("percentU8", 5, Some(4), Some("%"), U8),
    t("percentV16", 8, Some(10), Some("%"), scaled(Width::Two, true, 1, 100)),
    t("percentV8", 6, Some(1), Some("%"), I8),
    t("phaseangledeg", 14, Some(55), Some("°"), F32),
    t("phaseanglerad", 14, Some(54), Some("rad"), F32),
    t("power", 14, Some(56), Some("W"), F32),
    t("power_2byte", 9, Some(24), Some("kW"), F16_SYMMETRIC),
    t("power_density", 9, Some(22), Some("W/m²"), F16_SYMMETRIC),
    t("powerfactor", 14, Some(57), None, F32),
    t("ppm", 9, Some(8), Some("ppm"), F16_POSITIVE),
    t("pressure", 14, Some(58), Some("Pa"), F32),
    t("pressure_2byte", 9, Some(6), Some("Pa"), F16_POSITIVE),
    t("prop_data_type", 7, Some(10), None, U16),
    t("pulse", 5, Some(10), Some("counter pulses"), U8),
    t("pulse_2byte", 7, Some(1), Some("pulses"), U16),
    t("pulse_2byte_signed", 8, Some(1), Some("pulses"), I16),
    t("pulse_4_ucount", 12, Some(1), Some("counter pulses"), U32),
    t("pulse_4byte", 13, Some(1), Some("counter pulses"), I32),
    t("rain_amount", 9, Some(26), Some("L/m²"), F16),
    t("reactance", 14, Some(59), Some("Ω"), F32),
    t("reactive_energy", 13, Some(12), Some("VARh"), I32),
    t("reactive_energy_kvarh", 13, Some(15), Some("kVARh"), I32),
    t("resistance", 14, Some(60), Some("Ω"), F32),
    t("resistivity", 14, Some(61), Some("Ωm"), F32),
    t("rotation_angle", 8, Some(11), Some("°"), I16),
    t("scene_number", 17, Some(1), None, Codec::SceneNumber),
    t("self_inductance", 14, Some(62), Some("H"), F32),
    t("solid_angle", 14, Some(63), Some("sr"), F32),
    t("sound_intensity", 14, Some(64), Some("W/m²"), F32),
    t("speed", 14, Some(65), Some("m/s"), F32),
    t("stepwise_blinds", 3, Some(8), Some("%"), Codec::StepControl),
    t("stepwise_dimming", 3, Some(7), Some("%"), Codec::StepControl),
    t("stress", 14, Some(66), Some("Pa"), F32),
    t("string", 16, Some(0), None, Codec::Text { charset: Charset::Ascii }),
    t("surface_tension", 14, Some(67), Some("N/m"), F32),
    t("tariff", 5, Some(6), None, U8),
    t("temperature", 9, Some(1), Some("°C"), float16(-273.0, 670_760.0)),
    t("temperature_a", 9, Some(3), Some("K/h"), F16_SYMMETRIC),
    t("temperature_difference", 14, Some(70), Some("K"), F32),
    t("temperature_difference_2byte", 9, Some(2), Some("K"), F16_SYMMETRIC),
    t("temperature_f", 9, Some(27), Some("°F"), float16(-459.6, 670_760.0)),
    t("thermal_capacity", 14, Some(71), Some("J/K"), F32),
    t("thermal_conductivity", 14, Some(72), Some("W/mK"), F32),
    t("thermoelectric_power", 14, Some(73), Some("V/K"), F32),
    t("time_1", 9, Some(10), Some("s"), F16_SYMMETRIC),
    t("time_2", 9, Some(11), Some("ms"), F16_SYMMETRIC),
    t("time_period_100msec", 7, Some(4), Some("ms"), scaled(Width::Two, false, 100, 1)),
    t("time_period_10msec", 7, Some(3), Some("ms"), scaled(Width::Two, false, 10, 1)),
    t("time_period_hrs", 7, Some(7), Some("h"), U16),
    t("time_period_min", 7, Some(6), Some("min"), U16),
    t("time_period_msec", 7, Some(2), Some("ms"), U16),
    t("time_period_sec", 7, Some(5), Some("s"), U16),
    t("time_seconds", 14, Some(74), Some("s"), F32),
    t("torque", 14, Some(75), Some("Nm"), F32),
    t("voltage", 9, Some(20), Some("mV"), F16_SYMMETRIC),
    t("volume", 14, Some(76), Some("m³"), F32),
    t("volume_flow", 9, Some(25), Some("L/h"), F16_SYMMETRIC),
    t("volume_flux", 14, Some(77), Some("m³/s"), F32),
    t("volume_liquid_litre", 12, Some(1200), Some("L"), U32),
    t("volume_m3", 12, Some(1201), Some("m³"), U32),
    t("weight", 14, Some(78), Some("N"), F32),
    t("wind_speed_kmh", 9, Some(28), Some("km/h"), F16_POSITIVE),
    t("wind_speed_ms", 9, Some(5), Some("m/s"), F16_POSITIVE),
    t("work", 14, Some(79), Some("J"), F32),
];
