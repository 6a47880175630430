use marlin_gcode::{
    decode_str, Axis, AutoHome, Decoder, Encoder, Extension, Flavor, Heater, Instruction,
    InvalidGCode, Line, LinearMove, MachineState, SetHeaterTemperature, EPSILON, WATERMARK,
};

const PREAMBLE: usize = 5;

/// Decodes `text` and encodes the result, returning the lines after the preamble.
fn reencode(text: &str) -> Vec<String> {
    let mut encoder = Encoder::new(Vec::new());
    encoder.encode_decoded(Decoder::new(text.as_bytes())).unwrap();
    let out = String::from_utf8(encoder.finish().unwrap()).unwrap();
    out.lines().skip(PREAMBLE).map(str::to_owned).collect()
}

fn fold(instructions: &[Instruction]) -> MachineState {
    let mut state = MachineState::new();
    for instruction in instructions {
        instruction.apply(&mut state);
    }
    state
}

fn assert_equivalent(a: &MachineState, b: &MachineState) {
    let close = |x: f64, y: f64| (x - y).abs() < EPSILON;
    for axis in Axis::ALL {
        assert!(close(a.axis(axis), b.axis(axis)), "{axis:?}: {a:?} vs {b:?}");
        assert_eq!(a.is_homed(axis), b.is_homed(axis));
    }
    for heater in Heater::ALL {
        assert!(close(a.temperature(heater), b.temperature(heater)));
    }
    assert!(close(a.e(), b.e()), "e: {a:?} vs {b:?}");
    assert!(close(a.f(), b.f()));
    assert!(close(a.fan_speed(), b.fan_speed()));
}

#[test]
fn output_starts_with_the_preamble() {
    let out = String::from_utf8(Encoder::new(Vec::new()).finish().unwrap()).unwrap();
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(
        lines,
        [WATERMARK, "; Flavor: Marlin", "G92 E0", "G90", "M83"]
    );
}

#[test]
fn a_single_move_renders_as_written() {
    let instructions = decode_str("G0 X5").unwrap();
    assert_eq!(instructions[0].render(&MachineState::new()), "G0 X5");
    assert_eq!(reencode("G0 X5"), ["G0 X5"]);
}

#[test]
fn relative_moves_are_folded_into_absolute_ones() {
    assert_eq!(reencode("G91\nG0 X10\nG0 X10"), ["G0 X10", "G0 X20"]);
}

#[test]
fn relative_extrusion_stays_relative() {
    assert_eq!(
        reencode("M83\nG0 X10 E10\nG0 X5 E5"),
        ["G1 X10 E10", "G1 X5 E5"]
    );
}

#[test]
fn absolute_extrusion_becomes_relative() {
    assert_eq!(
        reencode("G91\nM82\nG0 X10 E10\nG0 X5 E5"),
        ["G1 X10 E10", "G1 X15 E-5"]
    );
}

#[test]
fn absolute_extrusion_is_the_default() {
    assert_eq!(
        reencode("G1 X10 E5\nG1 X20 E7\nG1 X30 E7"),
        ["G1 X10 E5", "G1 X20 E2", "G0 X30"]
    );
}

#[test]
fn repeated_moves_are_dropped() {
    assert_eq!(
        reencode("G0 X10 Y10 Z10 E5\nG1 X10 Y10 Z10 E5"),
        ["G1 X10 Y10 Z10 E5"]
    );
    assert_eq!(
        reencode("G0 X10 Y10 Z10 E5\nG1 X5 Y10 Z15 E5"),
        ["G1 X10 Y10 Z10 E5", "G0 X5 Z15"]
    );
}

#[test]
fn round_trips_preserve_absolute_extrusion() {
    let text = "G28\nG1 X10 Y10 E2 F1200\nG1 X20 E3\nG92 E0\nG1 X30 E1.5\n";
    let original = decode_str(text).unwrap();
    let encoded = marlin_gcode::encode_to_string(&original).unwrap();
    let decoded = decode_str(&encoded).unwrap();
    assert_equivalent(&fold(&original), &fold(&decoded));
    assert_eq!(
        encoded.lines().skip(PREAMBLE).collect::<Vec<_>>(),
        [
            "G28",
            "G1 X10 Y10 F1200 E2",
            "G1 X20 E1",
            "G92 E0",
            "G1 X30 E1.5",
        ]
    );
}

#[test]
fn generated_instructions() {
    let state = MachineState::new();
    assert_eq!(
        Instruction::from(SetHeaterTemperature::hotend(97.7)).render(&state),
        "M104 S97.7"
    );
    assert_eq!(
        Instruction::from(AutoHome::new([Axis::X])).render(&state),
        "G28 X"
    );
}

#[test]
fn comments_and_foreign_lines_pass_through() {
    assert_eq!(
        reencode("G28; this is a test Comment\n; layer 1\nM117 Hello\n\nG91 ; relative"),
        [
            "G28; this is a test Comment",
            "; layer 1",
            "M117 Hello",
            "; relative"
        ]
    );
}

#[test]
fn moves_that_go_nowhere_vanish() {
    assert_eq!(
        reencode("G0 X10 Y10\nG0 X10 Y10 ; again\nG1 F1200\nG1 X10.000001 F1200"),
        ["G0 X10 Y10", "G0 F1200"]
    );
}

#[test]
fn position_offsets_are_kept() {
    assert_eq!(
        reencode("G1 X10 E5\nG92 X0 E0\nG1 X10 E3"),
        ["G1 X10 E5", "G92 X0 E0", "G1 X10 E3"]
    );
}

#[test]
fn invalid_lines_stop_the_pipeline_before_any_output() {
    let mut encoder = Encoder::new(Vec::new());
    let err = encoder
        .encode_decoded(Decoder::new("G28\nG28 O\n".as_bytes()))
        .unwrap_err();
    assert_eq!(
        err.invalid_gcode(),
        Some(&InvalidGCode::Unsupported("G28 L/O/R options"))
    );
    let out = String::from_utf8(encoder.finish().unwrap()).unwrap();
    assert!(out.ends_with("M83\nG28\n"));
}

#[test]
fn round_trips_preserve_the_state() {
    let text = "G28\n\
                M104 S210\n\
                M140 S60\n\
                G91\n\
                G0 X10 Y5\n\
                G0 Z0.2\n\
                M83\n\
                G1 X5 E1.5\n\
                G1 Y-3 E0.5 F1800\n\
                M106 S128\n\
                G90\n\
                G1 X0 Y0 E2\n\
                G0 X0 Y0\n";
    let original = decode_str(text).unwrap();
    let encoded = marlin_gcode::encode_to_string(&original).unwrap();
    let decoded = decode_str(&encoded).unwrap();
    assert_equivalent(&fold(&original), &fold(&decoded));
    assert_eq!(
        encoded.lines().skip(PREAMBLE).collect::<Vec<_>>(),
        [
            "G28",
            "M104 S210",
            "M140 S60",
            "G0 X10 Y5",
            "G0 Z0.2",
            "G1 X15 E1.5",
            "G1 Y2 F1800 E0.5",
            "M106 S128",
            "G1 X0 Y0 E2",
        ]
    );
}

/// `;TYPE:` markers as written by PrusaSlicer.
#[derive(Debug)]
struct LineType(String);

impl Extension for LineType {
    fn render(&self, _: &MachineState) -> String {
        format!(";TYPE:{}", self.0)
    }

    fn apply(&self, state: &mut MachineState) {
        state.set_extra("LineType", self.0.clone());
    }
}

fn line_type(
    line: &Line<'_>,
    _: Flavor,
    _: &MachineState,
) -> Result<Option<Instruction>, InvalidGCode> {
    Ok(line
        .code()
        .is_none()
        .then(|| line.comment())
        .flatten()
        .and_then(|c| c.strip_prefix("TYPE:"))
        .map(|t| Box::new(LineType(t.to_owned())).into()))
}

#[test]
fn slicer_metadata_is_tracked_by_extensions() {
    let text = ";TYPE:Perimeter\nG1 X1 E1\n;TYPE:Internal infill\nG1 X2 E1\n";
    let mut decoder = Decoder::new(text.as_bytes()).with_recognizer(line_type);
    let mut types = Vec::new();
    while let Some(instruction) = decoder.read_instruction().unwrap() {
        if let Instruction::LinearMove(LinearMove { x: Some(x), .. }) = instruction {
            let current = decoder.state().extra::<String>("LineType").cloned();
            types.push((x, current));
        }
    }
    assert_eq!(
        types,
        [
            (1., Some("Perimeter".to_owned())),
            (2., Some("Internal infill".to_owned()))
        ]
    );

    let decoder = Decoder::new(text.as_bytes()).with_recognizer(line_type);
    let mut encoder = Encoder::new(Vec::new());
    encoder.encode_decoded(decoder).unwrap();
    assert_eq!(
        encoder.state().extra::<String>("LineType").map(String::as_str),
        Some("Internal infill")
    );
    let out = String::from_utf8(encoder.finish().unwrap()).unwrap();
    // absolute E: the second E1 feeds nothing
    assert!(out.ends_with(";TYPE:Perimeter\nG1 X1 E1\n;TYPE:Internal infill\nG0 X2\n"));
}

#[cfg(feature = "async")]
#[test]
fn suspending_pipeline() {
    use futures::stream::{self, TryStreamExt};

    let chunks =
        ["G91\nG0 X1", "0\nG0 X10\nM83\n", "G1 E2\n"].map(|c| std::io::Result::Ok(c.as_bytes()));
    let source = stream::iter(chunks).into_async_read();
    let mut encoder = Encoder::new_async(Vec::new());
    futures_executor::block_on(async {
        encoder.encode_stream(Decoder::new(source)).await.unwrap();
        encoder.close().await.unwrap();
    });
    let out = String::from_utf8(encoder.into_inner()).unwrap();
    let lines: Vec<_> = out.lines().skip(PREAMBLE).collect();
    assert_eq!(lines, ["G0 X10", "G0 X20", "G1 E2"]);
}
