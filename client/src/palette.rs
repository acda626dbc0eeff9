pub const SECTOR_COLORS: [&str; 8] = [
    "#e4572e", "#f3a712", "#29335c", "#669bbc", "#a8c686", "#8e44ad", "#17bebb", "#d81159",
];

/// One fill per sector. Neighbours never share a color, including the
/// wrap-around pair between the last and the first sector.
pub fn sector_colors(count: usize) -> Vec<String> {
    (0..count)
        .map(|index| {
            let mut slot = index % SECTOR_COLORS.len();
            // The last sector would otherwise touch the first in the same color.
            if count > 1 && index + 1 == count && slot == 0 {
                slot = 1;
            }
            SECTOR_COLORS[slot].to_string()
        })
        .collect()
}

pub fn label_color(fill: &str) -> &'static str {
    match fill {
        "#29335c" | "#8e44ad" | "#d81159" | "#e4572e" => "#ffffff",
        _ => "#1f1f1f",
    }
}
