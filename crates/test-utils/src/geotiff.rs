//! Minimal GeoTIFF writer for test fixtures.
//!
//! Writes uncompressed float32 images with ModelPixelScale, ModelTiepoint,
//! a GeoKey directory and optionally GDAL_NODATA. One, three or four bands
//! are supported (Gray, RGB and RGBA sample layouts).

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tiff::encoder::{colortype, ImageEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;

/// What to write.
#[derive(Debug, Clone)]
pub struct GeoTiffFixture {
    pub width: usize,
    pub height: usize,
    /// Row-major bands, `width * height` values each
    pub bands: Vec<Vec<f32>>,
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_size: f64,
    /// ProjectedCSTypeGeoKey (e.g. 32633); geographic 4326 when None
    pub epsg: Option<u16>,
    /// GTCitationGeoKey text, written instead of an EPSG code when set
    pub citation: Option<String>,
    pub nodata: Option<f64>,
}

impl GeoTiffFixture {
    pub fn utm(
        epsg: u16,
        origin_x: f64,
        origin_y: f64,
        pixel_size: f64,
        width: usize,
        height: usize,
        bands: Vec<Vec<f32>>,
    ) -> Self {
        Self {
            width,
            height,
            bands,
            origin_x,
            origin_y,
            pixel_size,
            epsg: Some(epsg),
            citation: None,
            nodata: None,
        }
    }

    pub fn with_citation(mut self, citation: &str) -> Self {
        self.epsg = None;
        self.citation = Some(citation.to_string());
        self
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    fn interleaved(&self) -> Vec<f32> {
        let samples = self.bands.len();
        let mut data = Vec::with_capacity(self.width * self.height * samples);
        for i in 0..self.width * self.height {
            for band in &self.bands {
                data.push(band[i]);
            }
        }
        data
    }

    fn geokeys(&self) -> (Vec<u16>, Option<String>) {
        let mut keys: Vec<u16> = vec![1, 1, 0, 0];
        let mut ascii = None;

        match (&self.citation, self.epsg) {
            (Some(citation), _) => {
                keys.extend_from_slice(&[1024, 0, 1, 1]);
                keys.extend_from_slice(&[1025, 0, 1, 1]);
                let text = format!("{}|", citation);
                keys.extend_from_slice(&[1026, 34737, text.len() as u16, 0]);
                ascii = Some(text);
            }
            (None, Some(epsg)) => {
                keys.extend_from_slice(&[1024, 0, 1, 1]);
                keys.extend_from_slice(&[1025, 0, 1, 1]);
                keys.extend_from_slice(&[3072, 0, 1, epsg]);
            }
            (None, None) => {
                keys.extend_from_slice(&[1024, 0, 1, 2]);
                keys.extend_from_slice(&[1025, 0, 1, 1]);
                keys.extend_from_slice(&[2048, 0, 1, 4326]);
            }
        }
        keys[3] = ((keys.len() - 4) / 4) as u16;
        (keys, ascii)
    }
}

/// Write `fixture` to `path`.
pub fn write_geotiff(path: &Path, fixture: &GeoTiffFixture) -> Result<(), Box<dyn std::error::Error>> {
    let expected = fixture.width * fixture.height;
    if fixture.bands.iter().any(|b| b.len() != expected) {
        return Err("band length does not match dimensions".into());
    }

    let file = BufWriter::new(File::create(path)?);
    let mut encoder = TiffEncoder::new(file)?;
    let (w, h) = (fixture.width as u32, fixture.height as u32);
    let data = fixture.interleaved();

    match fixture.bands.len() {
        1 => {
            let mut image = encoder.new_image::<colortype::Gray32Float>(w, h)?;
            write_geo_tags(&mut image, fixture)?;
            image.write_data(&data)?;
        }
        3 => {
            let mut image = encoder.new_image::<colortype::RGB32Float>(w, h)?;
            write_geo_tags(&mut image, fixture)?;
            image.write_data(&data)?;
        }
        4 => {
            let mut image = encoder.new_image::<colortype::RGBA32Float>(w, h)?;
            write_geo_tags(&mut image, fixture)?;
            image.write_data(&data)?;
        }
        n => return Err(format!("{} bands cannot be written", n).into()),
    }
    Ok(())
}

fn write_geo_tags<W, C, K>(
    image: &mut ImageEncoder<'_, W, C, K>,
    fixture: &GeoTiffFixture,
) -> Result<(), Box<dyn std::error::Error>>
where
    W: std::io::Write + std::io::Seek,
    C: colortype::ColorType,
    K: TiffKind,
{
    let dir = image.encoder();
    let scale = [fixture.pixel_size, fixture.pixel_size, 0.0];
    dir.write_tag(Tag::ModelPixelScaleTag, &scale[..])?;
    let tie = [0.0, 0.0, 0.0, fixture.origin_x, fixture.origin_y, 0.0];
    dir.write_tag(Tag::ModelTiepointTag, &tie[..])?;

    let (keys, ascii) = fixture.geokeys();
    dir.write_tag(Tag::GeoKeyDirectoryTag, &keys[..])?;
    if let Some(text) = ascii {
        dir.write_tag(Tag::GeoAsciiParamsTag, text.as_str())?;
    }
    if let Some(nodata) = fixture.nodata {
        dir.write_tag(Tag::GdalNodata, nodata.to_string().as_str())?;
    }
    Ok(())
}
