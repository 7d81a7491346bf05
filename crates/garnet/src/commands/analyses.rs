use analyzer::analyses::AnalysisKind;

pub fn run() {
    for kind in AnalysisKind::all() {
        println!("{kind}: {}", kind.summary());
    }
}
