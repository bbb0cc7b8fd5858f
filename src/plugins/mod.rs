pub mod socials;
