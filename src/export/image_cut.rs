//! Image Cutting - turn a tileset region into a standalone tile image
//!
//! The master image is upscaled once by the project's pixel scale; every tile
//! is then cropped from the scaled copy and has its inter-cell padding removed
//! so the cells sit flush against each other.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::tile::{GridGeometry, TileBounds, TileRecord};

use super::ExportError;

/// Upscale `master` by an integer factor with nearest-neighbour sampling
pub fn scale_master(master: &RgbaImage, pixel_scale: u32) -> RgbaImage {
    if pixel_scale <= 1 {
        return master.clone();
    }
    imageops::resize(
        master,
        master.width() * pixel_scale,
        master.height() * pixel_scale,
        FilterType::Nearest,
    )
}

/// Copy the pixels inside `bounds` out of `master`
pub fn crop_region(master: &RgbaImage, bounds: &TileBounds) -> Result<RgbaImage, ExportError> {
    if bounds.right > master.width() || bounds.bottom > master.height() {
        return Err(ExportError::OutOfBounds {
            bounds: *bounds,
            width: master.width(),
            height: master.height(),
        });
    }
    Ok(imageops::crop_imm(master, bounds.left, bounds.top, bounds.width(), bounds.height()).to_image())
}

/// Remove the padding strips between grid cells
///
/// The result is exactly `cells_x * cell_size` by `cells_y * cell_size`, with
/// each cell copied unchanged to its de-padded position. Images from a grid
/// without padding are returned as is.
pub fn strip_padding(image: &RgbaImage, grid: GridGeometry) -> RgbaImage {
    if grid.padding == 0 {
        return image.clone();
    }

    let cell = grid.cell_size;
    let pitch = grid.pitch();
    let cells_x = grid.cells_in(image.width());
    let cells_y = grid.cells_in(image.height());

    let mut out = RgbaImage::new(cells_x * cell, cells_y * cell);
    for cy in 0..cells_y {
        for cx in 0..cells_x {
            let src_x = cx * pitch;
            let src_y = cy * pitch;
            // The last cell may be clipped when the trailing padding was left out
            let w = cell.min(image.width().saturating_sub(src_x));
            let h = cell.min(image.height().saturating_sub(src_y));
            let chunk = imageops::crop_imm(image, src_x, src_y, w, h).to_image();
            imageops::replace(&mut out, &chunk, (cx * cell) as i64, (cy * cell) as i64);
        }
    }
    out
}

/// Cut the image for one tile out of the scaled master
pub fn cut_tile(master: &RgbaImage, tile: &TileRecord) -> Result<RgbaImage, ExportError> {
    let region = crop_region(master, &tile.bounds)?;
    Ok(strip_padding(&region, tile.grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Category;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const GAP: Rgba<u8> = Rgba([255, 0, 255, 255]);

    /// 2x2 cells of 4px with 1px magenta padding, colored red, green, blue, white
    fn padded_sheet() -> RgbaImage {
        let colors = [[RED, GREEN], [BLUE, WHITE]];
        RgbaImage::from_fn(10, 10, |x, y| {
            if x % 5 == 4 || y % 5 == 4 {
                GAP
            } else {
                colors[(y / 5) as usize][(x / 5) as usize]
            }
        })
    }

    #[test]
    fn test_scale_master_nearest() {
        let mut master = RgbaImage::from_pixel(2, 1, RED);
        master.put_pixel(1, 0, BLUE);
        let scaled = scale_master(&master, 3);
        assert_eq!(scaled.dimensions(), (6, 3));
        assert_eq!(*scaled.get_pixel(2, 2), RED);
        assert_eq!(*scaled.get_pixel(3, 0), BLUE);
        assert_eq!(scale_master(&master, 1), master);
    }

    #[test]
    fn test_crop_region() {
        let sheet = padded_sheet();
        let bounds = TileBounds::new(5, 0, 9, 4).unwrap();
        let tile = crop_region(&sheet, &bounds).unwrap();
        assert_eq!(tile.dimensions(), (4, 4));
        assert!(tile.pixels().all(|p| *p == GREEN));
    }

    #[test]
    fn test_crop_out_of_bounds() {
        let sheet = padded_sheet();
        let bounds = TileBounds::new(5, 5, 15, 10).unwrap();
        assert!(matches!(
            crop_region(&sheet, &bounds),
            Err(ExportError::OutOfBounds { width: 10, height: 10, .. })
        ));
    }

    #[test]
    fn test_strip_padding_splices_cells() {
        let grid = GridGeometry::new(4, 1).unwrap();
        for extent in [9, 10] {
            let region = imageops::crop_imm(&padded_sheet(), 0, 0, extent, extent).to_image();
            let out = strip_padding(&region, grid);
            assert_eq!(out.dimensions(), (8, 8));
            assert!(out.pixels().all(|p| *p != GAP));
            assert_eq!(*out.get_pixel(0, 0), RED);
            assert_eq!(*out.get_pixel(7, 0), GREEN);
            assert_eq!(*out.get_pixel(3, 4), BLUE);
            assert_eq!(*out.get_pixel(4, 7), WHITE);
        }
    }

    #[test]
    fn test_strip_padding_single_cell() {
        let grid = GridGeometry::new(4, 1).unwrap();
        let region = imageops::crop_imm(&padded_sheet(), 5, 5, 4, 4).to_image();
        let out = strip_padding(&region, grid);
        assert_eq!(out.dimensions(), (4, 4));
        assert!(out.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_cut_tile() {
        let sheet = padded_sheet();
        let bounds = TileBounds::new(0, 5, 10, 10).unwrap();
        let tile = TileRecord::new(Category::Bgo, bounds, GridGeometry::new(4, 1).unwrap());
        let out = cut_tile(&sheet, &tile).unwrap();
        assert_eq!(out.dimensions(), (8, 4));
        assert_eq!(*out.get_pixel(1, 1), BLUE);
        assert_eq!(*out.get_pixel(5, 1), WHITE);
    }
}
